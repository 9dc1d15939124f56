mod panel;
mod view;

pub use panel::{PanelAgent, PanelHandle};
pub use view::{PanelBody, PanelView};
