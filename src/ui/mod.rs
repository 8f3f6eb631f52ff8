//! GTK shell: login window, chat window and the main-loop wiring.

pub mod chat;
pub mod login;

use std::rc::Rc;

use gtk4::glib;
use gtk4::prelude::*;
use libadwaita::prelude::*;

use crate::api::{ApiClient, Backend, Credentials, Role, UserRecord};
use crate::app::{
    handle_app_event, handle_device_event, AppEvent, AppState, DeviceEvent, SessionContext,
};
use crate::config::Config;
use crate::recorder::CpalDevice;
use crate::storage::{self, FileStorage, Storage};

const DOCTOR_UNSUPPORTED: &str =
    "This client supports patient consultations only. Please use the clinic dashboard.";

/// Long-lived services shared by every window.
pub struct Shell {
    config: Config,
    storage: Rc<dyn Storage>,
    api: Rc<ApiClient>,
    // Owns the worker threads that run backend requests.
    _tokio_rt: tokio::runtime::Runtime,
}

/// Entry point from `connect_activate`.
pub fn launch(app: &libadwaita::Application) {
    let config = Config::load();
    log::info!("Backend at {}", config.base_url());

    let tokio_rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            app.quit();
            return;
        }
    };
    let api = match ApiClient::new(&config, tokio_rt.handle().clone()) {
        Ok(api) => api,
        Err(e) => {
            log::error!("Failed to build HTTP client: {e}");
            app.quit();
            return;
        }
    };

    load_css();

    let shell = Rc::new(Shell {
        config,
        storage: Rc::new(FileStorage::open_default()),
        api: Rc::new(api),
        _tokio_rt: tokio_rt,
    });

    match storage::load_user(&*shell.storage) {
        Some(user) if user.role == Role::Patient => show_chat(app, &shell, user),
        _ => show_login(app, &shell),
    }
}

/// Blocking notice with a single OK button.
pub fn alert(parent: &impl IsA<gtk4::Widget>, message: &str) {
    let dialog = libadwaita::AlertDialog::new(Some("Consult Desk"), Some(message));
    dialog.add_response("ok", "OK");
    dialog.present(Some(parent));
}

fn show_login(app: &libadwaita::Application, shell: &Rc<Shell>) {
    let login = login::build_login_window(app);
    {
        let app = app.clone();
        let shell = shell.clone();
        let window = login.window.clone();
        let email_row = login.email_row.clone();
        let password_row = login.password_row.clone();
        login.login_button.connect_clicked(move |button| {
            let credentials = Credentials {
                email: email_row.text().trim().to_string(),
                password: password_row.text().to_string(),
            };
            if credentials.email.is_empty() || credentials.password.is_empty() {
                return;
            }
            button.set_sensitive(false);

            let app = app.clone();
            let shell = shell.clone();
            let window = window.clone();
            let button = button.clone();
            glib::spawn_future_local(async move {
                let result = shell.api.login(credentials).await;
                button.set_sensitive(true);
                match result {
                    Ok(user) if user.role == Role::Doctor => {
                        log::info!("Doctor account {} refused", user.email);
                        alert(&window, DOCTOR_UNSUPPORTED);
                    }
                    Ok(user) => {
                        log::info!("Logged in as {}", user.email);
                        if let Err(e) = storage::save_user(&*shell.storage, &user) {
                            log::warn!("Failed to store user: {e}");
                        }
                        show_chat(&app, &shell, user);
                        window.close();
                    }
                    Err(e) => {
                        log::error!("Login failed: {e}");
                        alert(&window, "Invalid credentials");
                    }
                }
            });
        });
    }
    login.window.present();
}

fn show_chat(app: &libadwaita::Application, shell: &Rc<Shell>, user: UserRecord) {
    let (event_tx, event_rx) = async_channel::unbounded::<AppEvent>();
    let (device_tx, device_rx) = async_channel::unbounded::<DeviceEvent>();

    let view = Rc::new(chat::build_chat_window(app, &user, event_tx));
    let context = Rc::new(SessionContext::restore(shell.storage.clone()));
    let backend: Rc<dyn Backend> = shell.api.clone();
    let state = Rc::new(
        AppState::new(
            user.id,
            context,
            backend,
            view.clone(),
            Box::new(CpalDevice),
            device_tx,
        )
        .with_auto_send(shell.config.auto_send_dictation),
    );

    // Closing the window ends both loops, which drops the state and any open stream.
    {
        let event_rx = event_rx.clone();
        let device_rx = device_rx.clone();
        view.window.connect_close_request(move |_| {
            event_rx.close();
            device_rx.close();
            glib::Propagation::Proceed
        });
    }

    {
        let app = app.clone();
        let shell = shell.clone();
        let window = view.window.clone();
        view.logout_button.connect_clicked(move |_| {
            log::info!("Logging out");
            if let Err(e) = shell.storage.clear() {
                log::warn!("Failed to clear storage: {e}");
            }
            show_login(&app, &shell);
            window.close();
        });
    }

    {
        let state = state.clone();
        glib::spawn_future_local(async move {
            while let Ok(event) = event_rx.recv().await {
                glib::spawn_future_local(handle_app_event(state.clone(), event));
            }
        });
    }

    {
        let state = state.clone();
        glib::spawn_future_local(async move {
            while let Ok(event) = device_rx.recv().await {
                handle_device_event(&state, event).await;
            }
        });
    }

    view.window.present();
    glib::spawn_future_local(async move {
        state.sessions.open().await;
    });
}

fn load_css() {
    let Some(display) = gtk4::gdk::Display::default() else {
        return;
    };
    let css_provider = gtk4::CssProvider::new();
    css_provider.load_from_string(
        r#"
        .bubble {
            border-radius: 14px;
            padding: 8px 12px;
        }
        .bubble-user {
            background-color: @accent_bg_color;
            color: @accent_fg_color;
        }
        .bubble-assistant {
            background-color: alpha(@window_fg_color, 0.08);
        }
        .mic-button.recording {
            background-color: #e01b24;
            color: white;
        }
        row.active-session {
            font-weight: bold;
        }
        "#,
    );
    gtk4::style_context_add_provider_for_display(
        &display,
        &css_provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
