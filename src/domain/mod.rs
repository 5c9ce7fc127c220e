// Domain layer: table/message models, the fixed sheet schema, and the mail ports.

pub mod model;
pub mod ports;
pub mod schema;
