use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::models::SummaryMode;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Quit,
    NextTab,
    PrevTab,
    Summarize(SummaryMode),
    SaveSummary,
    DismissPanel,
    CloseTab,
    OpenInBrowser,
    ShowHelp,
    HideHelp,
    // URL input actions
    OpenTabStart,
    UrlInputChar(char),
    UrlInputBackspace,
    UrlInputConfirm,
    UrlInputCancel,
}

pub fn handle_key_event(key: KeyEvent, url_input_active: bool, show_help: bool) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // URL input mode
    if url_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::UrlInputConfirm),
            KeyCode::Esc => Some(AppAction::UrlInputCancel),
            KeyCode::Backspace => Some(AppAction::UrlInputBackspace),
            KeyCode::Char(c) => Some(AppAction::UrlInputChar(c)),
            _ => None,
        };
    }

    // Normal mode
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Tab, _) | (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(AppAction::NextTab),
        (KeyCode::BackTab, _) | (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(AppAction::PrevTab),

        (KeyCode::Char('1'), _) => Some(AppAction::Summarize(SummaryMode::All)),
        (KeyCode::Char('2'), _) => Some(AppAction::Summarize(SummaryMode::ThreeKeys)),
        (KeyCode::Char('3'), _) => Some(AppAction::Summarize(SummaryMode::Short)),
        (KeyCode::Char('4'), _) => Some(AppAction::Summarize(SummaryMode::Pareto)),

        (KeyCode::Char('s'), _) => Some(AppAction::SaveSummary),
        (KeyCode::Char('x'), _) | (KeyCode::Esc, _) => Some(AppAction::DismissPanel),
        (KeyCode::Char('w'), _) => Some(AppAction::CloseTab),
        (KeyCode::Char('o'), _) => Some(AppAction::OpenTabStart),
        (KeyCode::Char('b'), _) => Some(AppAction::OpenInBrowser),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}
