pub mod history_list;
pub mod popup;
pub mod reminder_form;
pub mod reminder_list;

pub use history_list::HistoryList;
pub use reminder_form::ReminderForm;
pub use reminder_list::ReminderList;
