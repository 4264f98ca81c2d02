//! Desktop notification permission flow

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

/// Permission state as recorded by the platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Never asked, or no prior record
    #[default]
    Unknown,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub message: String,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Platform side of notifications
pub trait NotificationBackend {
    fn is_supported(&self) -> bool;
    fn permission(&self) -> Permission;
    /// Prompt the user; resolves once they decide
    fn request_permission(&self) -> impl Future<Output = Permission> + Send;
    fn show(&self, request: &NotificationRequest);
}

/// What a show request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    Shown,
    /// Permission denied, now or after prompting
    Suppressed,
    Unsupported,
}

pub struct Notifier<B> {
    backend: B,
}

impl<B: NotificationBackend> Notifier<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Show `request`, prompting for permission first if never asked.
    /// After a prompt only this one request is shown, and only if granted.
    pub async fn show(&self, request: NotificationRequest) -> ShowOutcome {
        if !self.backend.is_supported() {
            warn!("Desktop notifications are not supported");
            return ShowOutcome::Unsupported;
        }

        match self.backend.permission() {
            Permission::Granted => {
                self.backend.show(&request);
                ShowOutcome::Shown
            }
            Permission::Denied => {
                debug!(title = %request.title, "Notification suppressed, permission denied");
                ShowOutcome::Suppressed
            }
            Permission::Unknown => match self.backend.request_permission().await {
                Permission::Granted => {
                    self.backend.show(&request);
                    ShowOutcome::Shown
                }
                other => {
                    debug!(?other, title = %request.title, "Notification permission not granted");
                    ShowOutcome::Suppressed
                }
            },
        }
    }
}

/// Backend that writes notifications to the log. The answer to the
/// permission prompt is fixed at construction.
pub struct LogBackend {
    state: Mutex<Permission>,
    prompt_answer: Permission,
    shown: Mutex<Vec<NotificationRequest>>,
    prompts: Mutex<u32>,
}

impl LogBackend {
    pub fn new(initial: Permission, prompt_answer: Permission) -> Self {
        Self {
            state: Mutex::new(initial),
            prompt_answer,
            shown: Mutex::new(Vec::new()),
            prompts: Mutex::new(0),
        }
    }

    pub fn shown(&self) -> Vec<NotificationRequest> {
        self.shown.lock().clone()
    }

    pub fn prompts(&self) -> u32 {
        *self.prompts.lock()
    }
}

impl NotificationBackend for LogBackend {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> Permission {
        *self.state.lock()
    }

    fn request_permission(&self) -> impl Future<Output = Permission> + Send {
        *self.prompts.lock() += 1;
        let answer = self.prompt_answer;
        *self.state.lock() = answer;
        async move { answer }
    }

    fn show(&self, request: &NotificationRequest) {
        info!(title = %request.title, "Notification: {}", request.message);
        self.shown.lock().push(request.clone());
    }
}
