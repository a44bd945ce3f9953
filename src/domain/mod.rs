//! Domain layer: entities, value objects, the balance validator and the
//! ports the application layer consumes.

pub mod balance;
pub mod ids;
pub mod money;
pub mod payment;
pub mod ports;
pub mod validator;
