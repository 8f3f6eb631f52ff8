use std::cell::RefCell;
use std::rc::Rc;

use gtk4::glib;
use gtk4::prelude::*;
use gtk4::Align;
use libadwaita::prelude::*;

use crate::api::{SessionRecord, UserRecord};
use crate::app::view::INPUT_PLACEHOLDER;
use crate::app::{AppEvent, Bubble, BubbleRole, Header, View};

/// Handles returned from building the chat window. Implements [`View`].
pub struct ChatView {
    pub window: libadwaita::ApplicationWindow,
    pub logout_button: gtk4::Button,
    toast_overlay: libadwaita::ToastOverlay,
    title: libadwaita::WindowTitle,
    session_list: gtk4::ListBox,
    listed: Rc<RefCell<Vec<SessionRecord>>>,
    transcript: gtk4::Box,
    transcript_scroller: gtk4::ScrolledWindow,
    entry: gtk4::Entry,
    mic_button: gtk4::Button,
}

/// Build the consultation window: session sidebar, transcript, input row.
pub fn build_chat_window(
    app: &libadwaita::Application,
    user: &UserRecord,
    events: async_channel::Sender<AppEvent>,
) -> ChatView {
    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("Consult Desk")
        .default_width(900)
        .default_height(640)
        .build();

    let toolbar_view = libadwaita::ToolbarView::new();
    let header = libadwaita::HeaderBar::new();
    let title = libadwaita::WindowTitle::new(Header::NewConsultation.title(), "");
    header.set_title_widget(Some(&title));

    let logout_button = gtk4::Button::from_icon_name("system-log-out-symbolic");
    logout_button.set_tooltip_text(Some("Log out"));
    header.pack_end(&logout_button);
    toolbar_view.add_top_bar(&header);

    // --- Sidebar ---
    let sidebar = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
    sidebar.set_width_request(240);
    sidebar.set_margin_start(12);
    sidebar.set_margin_end(12);
    sidebar.set_margin_top(12);
    sidebar.set_margin_bottom(12);

    let user_label = gtk4::Label::new(Some(user.display_name()));
    user_label.add_css_class("heading");
    user_label.set_xalign(0.0);
    sidebar.append(&user_label);

    let new_chat_button = gtk4::Button::with_label("New Chat");
    new_chat_button.add_css_class("suggested-action");
    sidebar.append(&new_chat_button);

    let session_list = gtk4::ListBox::new();
    session_list.add_css_class("navigation-sidebar");
    let list_scroller = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .vexpand(true)
        .child(&session_list)
        .build();
    sidebar.append(&list_scroller);

    // --- Conversation ---
    let conversation = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    conversation.set_hexpand(true);

    let transcript = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
    transcript.set_margin_start(16);
    transcript.set_margin_end(16);
    transcript.set_margin_top(12);
    transcript.set_margin_bottom(12);
    let transcript_scroller = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .vexpand(true)
        .child(&transcript)
        .build();
    conversation.append(&transcript_scroller);

    let input_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    input_row.set_margin_start(12);
    input_row.set_margin_end(12);
    input_row.set_margin_top(8);
    input_row.set_margin_bottom(12);

    let mic_button = gtk4::Button::from_icon_name("audio-input-microphone-symbolic");
    mic_button.add_css_class("mic-button");
    mic_button.set_tooltip_text(Some("Dictate"));
    let entry = gtk4::Entry::builder()
        .placeholder_text(INPUT_PLACEHOLDER)
        .hexpand(true)
        .build();
    let send_button = gtk4::Button::from_icon_name("mail-send-symbolic");
    send_button.add_css_class("suggested-action");

    input_row.append(&mic_button);
    input_row.append(&entry);
    input_row.append(&send_button);
    conversation.append(&input_row);

    let body = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    body.append(&sidebar);
    body.append(&gtk4::Separator::new(gtk4::Orientation::Vertical));
    body.append(&conversation);

    toolbar_view.set_content(Some(&body));
    let toast_overlay = libadwaita::ToastOverlay::new();
    toast_overlay.set_child(Some(&toolbar_view));
    window.set_content(Some(&toast_overlay));

    // --- Wiring ---
    let listed: Rc<RefCell<Vec<SessionRecord>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let listed = listed.clone();
        let sender = events.clone();
        session_list.connect_row_activated(move |_, row| {
            let selected = usize::try_from(row.index())
                .ok()
                .and_then(|i| listed.borrow().get(i).cloned());
            if let Some(session) = selected {
                let _ = sender.try_send(AppEvent::SessionSelected(session));
            }
        });
    }
    {
        let sender = events.clone();
        new_chat_button.connect_clicked(move |_| {
            let _ = sender.try_send(AppEvent::NewChatRequested);
        });
    }
    {
        let sender = events.clone();
        mic_button.connect_clicked(move |_| {
            let _ = sender.try_send(AppEvent::MicToggled);
        });
    }
    {
        let sender = events.clone();
        entry.connect_activate(move |_| {
            let _ = sender.try_send(AppEvent::SendRequested);
        });
    }
    send_button.connect_clicked(move |_| {
        let _ = events.try_send(AppEvent::SendRequested);
    });

    ChatView {
        window,
        logout_button,
        toast_overlay,
        title,
        session_list,
        listed,
        transcript,
        transcript_scroller,
        entry,
        mic_button,
    }
}

fn bubble_widget(bubble: &Bubble) -> gtk4::Label {
    let label = gtk4::Label::new(Some(&bubble.text));
    label.set_wrap(true);
    label.set_selectable(true);
    label.set_xalign(0.0);
    label.set_max_width_chars(60);
    label.add_css_class("bubble");
    match bubble.role {
        BubbleRole::User => {
            label.set_halign(Align::End);
            label.add_css_class("bubble-user");
        }
        BubbleRole::Assistant => {
            label.set_halign(Align::Start);
            label.add_css_class("bubble-assistant");
        }
    }
    label
}

fn session_row(session: &SessionRecord) -> gtk4::ListBoxRow {
    let vbox = gtk4::Box::new(gtk4::Orientation::Vertical, 2);
    vbox.set_margin_top(6);
    vbox.set_margin_bottom(6);

    let preview = gtk4::Label::new(Some(&session.preview()));
    preview.set_xalign(0.0);
    preview.set_ellipsize(gtk4::pango::EllipsizeMode::End);
    vbox.append(&preview);

    let date = gtk4::Label::new(session.created_date().as_deref());
    date.set_xalign(0.0);
    date.add_css_class("dim-label");
    date.add_css_class("caption");
    vbox.append(&date);

    let row = gtk4::ListBoxRow::new();
    row.set_child(Some(&vbox));
    row
}

impl ChatView {
    fn scroll_to_bottom(&self) {
        let scroller = self.transcript_scroller.clone();
        glib::idle_add_local_once(move || {
            let adj = scroller.vadjustment();
            adj.set_value(adj.upper() - adj.page_size());
        });
    }
}

impl View for ChatView {
    fn render_transcript(&self, bubbles: &[Bubble]) {
        while let Some(child) = self.transcript.first_child() {
            self.transcript.remove(&child);
        }
        for bubble in bubbles {
            self.transcript.append(&bubble_widget(bubble));
        }
        self.scroll_to_bottom();
    }

    fn render_session_list(&self, sessions: &[SessionRecord], active_id: &str) {
        *self.listed.borrow_mut() = sessions.to_vec();
        self.session_list.remove_all();
        self.session_list.unselect_all();
        for session in sessions {
            let row = session_row(session);
            self.session_list.append(&row);
            if session.session_id == active_id {
                row.add_css_class("active-session");
                self.session_list.select_row(Some(&row));
            }
        }
    }

    fn set_header(&self, header: &Header) {
        self.title.set_title(header.title());
        self.title.set_subtitle(header.status());
    }

    fn set_input_state(&self, enabled: bool, placeholder: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.entry.set_text(v);
        }
        self.entry.set_sensitive(enabled);
        self.entry.set_placeholder_text(Some(placeholder));
    }

    fn input_text(&self) -> String {
        self.entry.text().to_string()
    }

    fn clear_input(&self) {
        self.entry.set_text("");
    }

    fn focus_input(&self) {
        self.entry.grab_focus();
        self.entry.set_position(-1);
    }

    fn set_recording(&self, recording: bool) {
        if recording {
            self.mic_button.add_css_class("recording");
            self.mic_button.set_tooltip_text(Some("Stop dictation"));
        } else {
            self.mic_button.remove_css_class("recording");
            self.mic_button.set_tooltip_text(Some("Dictate"));
        }
    }

    fn alert(&self, message: &str) {
        super::alert(&self.window, message);
    }

    fn notify(&self, message: &str) {
        let toast = libadwaita::Toast::new(message);
        toast.set_timeout(3);
        self.toast_overlay.add_toast(toast);
    }
}
