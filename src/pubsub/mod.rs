//! Подсистема Publish–Subscribe на стороне клиента.
//!
//! - `topic`: темы и правило переписывания тем канала публикаций.
//! - `envelope`: конверт канала публикаций и уведомление для слушателей.
//! - `listener`: записи списка подписчиков (сильные и слабые).
//! - `registry`: реестр тема → слушатели и рассылка с изоляцией.
//! - `broadcast`: устаревшая рассылка «обновитесь» по всем темам.

pub mod broadcast;
pub mod envelope;
pub mod listener;
pub mod registry;
pub mod topic;

// Публичный экспорт типов из вложенных модулей, чтобы упростить доступ к
// ним из внешнего кода.
pub use broadcast::broadcast_all;
pub use envelope::*;
pub use listener::*;
pub use registry::*;
pub use topic::*;
