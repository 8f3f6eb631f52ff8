use gtk4::prelude::*;
use libadwaita::prelude::*;

/// Handles returned from building the login window.
pub struct LoginWidgets {
    pub window: libadwaita::ApplicationWindow,
    pub email_row: libadwaita::EntryRow,
    pub password_row: libadwaita::PasswordEntryRow,
    pub login_button: gtk4::Button,
}

/// Build the sign-in window shown when no user is stored.
pub fn build_login_window(app: &libadwaita::Application) -> LoginWidgets {
    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("Consult Desk")
        .default_width(420)
        .default_height(360)
        .build();

    let toolbar_view = libadwaita::ToolbarView::new();
    toolbar_view.add_top_bar(&libadwaita::HeaderBar::new());

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    content.set_margin_start(24);
    content.set_margin_end(24);
    content.set_margin_top(24);
    content.set_margin_bottom(24);

    let group = libadwaita::PreferencesGroup::new();
    group.set_title("Sign In");
    group.set_description(Some("Use your patient account"));

    let email_row = libadwaita::EntryRow::builder().title("Email").build();
    group.add(&email_row);

    let password_row = libadwaita::PasswordEntryRow::builder()
        .title("Password")
        .build();
    group.add(&password_row);
    content.append(&group);

    let login_button = gtk4::Button::builder()
        .label("Log In")
        .halign(gtk4::Align::Center)
        .build();
    login_button.add_css_class("suggested-action");
    login_button.add_css_class("pill");
    content.append(&login_button);

    toolbar_view.set_content(Some(&content));
    window.set_content(Some(&toolbar_view));

    LoginWidgets {
        window,
        email_row,
        password_row,
        login_button,
    }
}
