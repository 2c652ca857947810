use crate::core::message::Role;
use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::input_box;
use crate::tui::components::{Launcher, MessageList, TitleBar};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

/// Draws one frame: the launcher while closed, the chat panel while open.
pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let store = app.controller.store();
    let is_pending = app.controller.is_pending();

    if !tui.open {
        let area = frame.area();
        Launcher::new(&app.persona.name, is_pending, store.count(Role::Assistant)).render(frame, area);
        return;
    }

    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(input_box::HEIGHT)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    MessageList::new(
        &mut tui.message_list,
        store,
        app.controller.session_id(),
        &app.persona.name,
        is_pending,
        tui.pulse_value,
        spinner_frame,
    )
    .render(frame, main_area);

    // Title bar reads has_unseen_content computed by the list this frame
    TitleBar::new(
        app.persona.name.clone(),
        app.status_message.clone(),
        app.service.name().to_string(),
        tui.message_list.has_unseen_content,
        is_pending,
    )
    .render(frame, title_area);

    tui.input_box.pending = is_pending;
    tui.input_box.render(frame, input_area);
}
