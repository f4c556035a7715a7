pub mod entry;
pub mod slot;

pub use entry::{
    ClassKind, NewEntryRequest, ScheduleEntry, TeacherType, UpdateEntryRequest, Weekday,
};
pub use slot::{NewSlotRequest, TimeSlot, UpdateSlotRequest};
