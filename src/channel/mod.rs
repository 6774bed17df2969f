//! Дуплексные каналы, которые открываются лениво.
//!
//! - `state`: жизненный цикл канала и наблюдаемое состояние.
//! - `directory`: поиск адреса канала через справочный сервис.
//! - `transport`: установка канала и чтение кадров (WebSocket).
//! - `opener`: фоновая задача открытия и ленивый канал.
//! - `output`, `publisher`: менеджеры двух каналов диспетчера.
//! - `memory`: транспорт в памяти.

pub mod directory;
pub mod memory;
pub mod opener;
pub mod output;
pub mod publisher;
pub mod state;
pub mod transport;

// Публичный экспорт типов из вложенных модулей, чтобы упростить доступ к
// ним из внешнего кода.
pub use directory::*;
pub use memory::*;
pub use opener::*;
pub use output::*;
pub use publisher::*;
pub use state::*;
pub use transport::*;
