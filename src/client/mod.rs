pub mod model;

// Публичный экспорт типов из вложенных модулей, чтобы упростить доступ к
// ним из внешнего кода.
pub use model::*;
