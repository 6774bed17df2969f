pub mod channel;
pub mod decode;
pub mod lookup;
pub mod request;

// Публичный экспорт всех типов ошибок из вложенных модулей.
pub use channel::*;
pub use decode::*;
pub use lookup::*;
pub use request::*;
