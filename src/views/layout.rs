use crate::domain::session::{Role, Session};
use crate::ui::Route;
use crate::views::theme::Theme;
use clap::ValueEnum;
use std::io::{self, Write};

pub const ADMIN_ONLY_TOOLTIP: &str = "Admin access required";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Page {
    #[default]
    Dashboard,
    Inventory,
    Reports,
    Alerts,
}

impl Page {
    pub const ALL: [Self; 4] = [Self::Dashboard, Self::Inventory, Self::Reports, Self::Alerts];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Inventory => "Inventory",
            Self::Reports => "Reports",
            Self::Alerts => "Alerts",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Inventory => "Inventory Management",
            Self::Reports => "Reports",
            Self::Alerts => "Alerts & Notifications",
        }
    }

    #[must_use]
    pub const fn route(self) -> Route {
        match self {
            Self::Dashboard => Route::Dashboard,
            Self::Inventory => Route::Inventory,
            Self::Reports => Route::Reports,
            Self::Alerts => Route::Alerts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidebar {
    pub entries: Vec<NavEntry>,
    pub user_name: String,
    pub initials: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navbar {
    pub title: &'static str,
    pub theme: Theme,
    pub actions: Vec<&'static str>,
}

/// What the current role may see and use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleVisibility {
    /// Admin-only elements are shown.
    pub show_admin_only: bool,
    /// Edit, delete and export actions are enabled.
    pub actions_enabled: bool,
    pub disabled_tooltip: Option<&'static str>,
}

impl RoleVisibility {
    #[must_use]
    pub fn for_role(role: &Role) -> Self {
        let is_viewer = *role == Role::Viewer;
        Self {
            show_admin_only: *role == Role::Admin,
            actions_enabled: !is_viewer,
            disabled_tooltip: is_viewer.then_some(ADMIN_ONLY_TOOLTIP),
        }
    }
}

/// Page chrome: sidebar, navbar and role-based visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub sidebar: Sidebar,
    pub navbar: Navbar,
    pub visibility: RoleVisibility,
}

impl Layout {
    #[must_use]
    pub fn new(session: &Session, theme: Theme, active: Page) -> Self {
        let user = session.user();
        let user_name = user
            .and_then(|u| u.first_name.as_deref().filter(|n| !n.is_empty()).or(u.email.as_deref()))
            .unwrap_or("User")
            .to_string();
        let initials = user_name.chars().next().map_or_else(|| "U".to_string(), |c| c.to_uppercase().to_string());
        let role = session.role();

        let entries = Page::ALL
            .iter()
            .map(|p| NavEntry { label: p.label(), path: p.route().path(), active: *p == active })
            .collect();

        Self {
            sidebar: Sidebar { entries, user_name, initials, role: role.to_string() },
            navbar: Navbar { title: active.title(), theme, actions: vec!["Toggle theme", "Notifications", "Logout"] },
            visibility: RoleVisibility::for_role(&role),
        }
    }

    /// # Errors
    /// Returns any error from the underlying writer.
    pub fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Invento | {} | theme: {}", self.navbar.title, self.navbar.theme)?;
        for entry in &self.sidebar.entries {
            let marker = if entry.active { ">" } else { " " };
            writeln!(out, "{marker} {:<10} {}", entry.label, entry.path)?;
        }
        writeln!(out, "[{}] {} ({})", self.sidebar.initials, self.sidebar.user_name, self.sidebar.role)?;
        writeln!(out, "Actions: {}", self.navbar.actions.join(", "))?;
        if let Some(tooltip) = self.visibility.disabled_tooltip {
            writeln!(out, "Edit, delete and export disabled: {tooltip}")?;
        }
        Ok(())
    }
}
