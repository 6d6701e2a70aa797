pub mod bus;

pub use bus::{
    Action, LocalTask, PageBus, PageSignal, PopupHandler, RowsHandler, SwitchHandler, task,
};
