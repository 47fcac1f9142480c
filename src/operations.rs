pub(crate) mod configurator;
pub(crate) mod user_storage;

pub use configurator::Configurator;
pub use user_storage::UserStorage;
