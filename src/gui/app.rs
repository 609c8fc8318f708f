use iced::widget::{button, column, container, image, row, scrollable, slider, text};
use iced::{Element, Length, Subscription, Task};

use super::{Message, ViewerConfig, ViewerState};
use crate::tuning::SliderKey;

pub fn boot(config: &ViewerConfig) -> ViewerState {
    ViewerState::new(config)
}

pub fn title(state: &ViewerState) -> String {
    format!("{} ({})", state.variant.title(), state.variant)
}

pub fn update(state: &mut ViewerState, message: Message) -> Task<Message> {
    match message {
        Message::Tick => state.advance(),
        Message::SliderChanged(key, value) => {
            let mut tuning = state.tuning;
            tuning.set(key, value);
            tracing::debug!(slider = %key, value, "tuning changed");
            state.set_tuning(tuning);
        }
        Message::ResetTuning => state.set_tuning(state.initial_tuning),
    }
    Task::none()
}

pub fn subscription(state: &ViewerState) -> Subscription<Message> {
    if state.is_playing() {
        iced::time::every(state.frame_interval).map(|_| Message::Tick)
    } else {
        Subscription::none()
    }
}

pub fn view(state: &ViewerState) -> Element<'_, Message> {
    let frame: Element<'_, Message> = match &state.frame {
        Some(handle) => image(handle.clone()).into(),
        None => text("Waiting for frames...").into(),
    };

    let display = column![frame, text(&state.status)].spacing(10);

    let content: Element<'_, Message> = if state.variant.is_tunable() {
        row![display, sliders(state)].spacing(20).into()
    } else {
        display.into()
    };

    container(content)
        .padding(20)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn sliders(state: &ViewerState) -> Element<'_, Message> {
    let mut panel = column![text("Parameters").size(20)].spacing(8);
    for key in SliderKey::ALL {
        let value = state.tuning.get(key);
        panel = panel.push(
            row![
                text(format!("{}: {}", key, value)).width(Length::Fixed(130.0)),
                slider(0..=key.max(), value, move |v| Message::SliderChanged(key, v)),
            ]
            .spacing(10),
        );
    }
    panel = panel.push(button(text("Reset")).on_press(Message::ResetTuning));

    scrollable(panel).width(Length::Fixed(340.0)).into()
}
