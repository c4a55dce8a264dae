// Résumé persistence: schema gate, local-first repository, HTTP handlers.
// The repository is the only writer of the local collection.

pub mod handlers;
pub mod repository;
pub mod validation;
