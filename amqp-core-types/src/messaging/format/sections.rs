//! Descriptors of the message sections that are carried as generic values

use crate::composite::DescribedType;

macro_rules! section {
    ($(#[$meta:meta])* $name:ident, $symbol:literal, $code:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl DescribedType for $name {
            const NAME: &'static str = $symbol;
            const CODE: u64 = $code;
        }
    };
}

section! {
    /// 3.2.2 Delivery Annotations
    /// <type name="delivery-annotations" class="restricted" source="annotations" provides="section">
    ///     <descriptor name="amqp:delivery-annotations:map" code="0x00000000:0x00000071"/>
    /// </type>
    DeliveryAnnotations, "amqp:delivery-annotations:map", 0x0000_0000_0000_0071
}

section! {
    /// 3.2.3 Message Annotations
    /// <type name="message-annotations" class="restricted" source="annotations" provides="section">
    ///     <descriptor name="amqp:message-annotations:map" code="0x00000000:0x00000072"/>
    /// </type>
    MessageAnnotations, "amqp:message-annotations:map", 0x0000_0000_0000_0072
}

section! {
    /// 3.2.5 Application Properties
    /// <type name="application-properties" class="restricted" source="map" provides="section">
    ///     <descriptor name="amqp:application-properties:map" code="0x00000000:0x00000074"/>
    /// </type>
    ApplicationProperties, "amqp:application-properties:map", 0x0000_0000_0000_0074
}

section! {
    /// 3.2.6 Data
    /// <type name="data" class="restricted" source="binary" provides="section">
    ///     <descriptor name="amqp:data:binary" code="0x00000000:0x00000075"/>
    /// </type>
    Data, "amqp:data:binary", 0x0000_0000_0000_0075
}

section! {
    /// 3.2.7 AMQP Sequence
    /// <type name="amqp-sequence" class="restricted" source="list" provides="section">
    ///     <descriptor name="amqp:amqp-sequence:list" code="0x00000000:0x00000076"/>
    /// </type>
    AmqpSequence, "amqp:amqp-sequence:list", 0x0000_0000_0000_0076
}

section! {
    /// 3.2.8 AMQP Value
    /// <type name="amqp-value" class="restricted" source="*" provides="section">
    ///     <descriptor name="amqp:amqp-value:*" code="0x00000000:0x00000077"/>
    /// </type>
    AmqpValue, "amqp:amqp-value:*", 0x0000_0000_0000_0077
}

section! {
    /// 3.2.9 Footer
    /// <type name="footer" class="restricted" source="annotations" provides="section">
    ///     <descriptor name="amqp:footer:map" code="0x00000000:0x00000078"/>
    /// </type>
    Footer, "amqp:footer:map", 0x0000_0000_0000_0078
}
