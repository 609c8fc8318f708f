mod app;
mod message;
mod state;

pub use message::Message;
pub use state::{ViewerConfig, ViewerState};

/// Open the viewer window and play until it is closed
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    tracing::info!(variant = %config.variant, "starting viewer");
    iced::application(move || app::boot(&config), app::update, app::view)
        .title(app::title)
        .subscription(app::subscription)
        .run()?;
    Ok(())
}
