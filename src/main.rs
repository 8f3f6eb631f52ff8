use gtk4::prelude::*;

fn main() {
    env_logger::init();
    log::info!("Consult Desk starting");

    let application = libadwaita::Application::builder()
        .application_id("com.github.consultdesk.client")
        .build();

    application.connect_activate(consult_desk::ui::launch);
    application.run();
}
