//! Message format: the header, properties and the descriptors of every section

mod header;
pub use header::{Builder as HeaderBuilder, Header};

mod message_id;
pub use message_id::MessageId;

mod properties;
pub use properties::{Address, Builder as PropertiesBuilder, Properties};

mod sections;
pub use sections::{
    AmqpSequence, AmqpValue, ApplicationProperties, Data, DeliveryAnnotations, Footer,
    MessageAnnotations,
};
