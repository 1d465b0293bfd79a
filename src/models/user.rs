use serde::{Deserialize, Serialize};

/// Profile captured during onboarding
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub industry: String,
    #[serde(default)]
    pub notification_preferences: NotificationPreferences,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotificationPreferences {
    pub project_reminders: bool,
    pub weekly_reports: bool,
    pub insights: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            project_reminders: true,
            weekly_reports: true,
            insights: true,
        }
    }
}
