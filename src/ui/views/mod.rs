mod modal;
mod page;

pub use modal::{draw_modal, ModalLayout};
pub use page::{draw_page, page_lines, PageLine};
