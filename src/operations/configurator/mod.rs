pub(crate) mod env;

pub trait Configurator {
    /// Name of the active environment, e.g. `local` or `production`.
    fn environment(&self) -> &str;

    fn bind_address(&self) -> (&str, u16);

    /// Selects the MongoDB backend when present.
    fn mongodb_uri(&self) -> Option<&str>;
    fn mongodb_database(&self) -> &str;
}
