//! Read-only queries by order id.

use super::{Operation, check_config, check_output_format, check_required};
use crate::{
    config::IpcConfig,
    error::Result,
    request::RequestAssembler,
    response::ResponseFormat,
};

macro_rules! order_query {
    ($(#[$doc:meta])* $name:ident, $method:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            order_id: String,
            output_format: ResponseFormat,
        }

        impl $name {
            /// Queries `order_id`, asking for a JSON reply.
            #[must_use]
            pub fn new(order_id: impl Into<String>) -> Self {
                Self { order_id: order_id.into(), output_format: ResponseFormat::Json }
            }

            /// Asks for a different reply format.
            #[must_use]
            pub const fn with_output_format(mut self, format: ResponseFormat) -> Self {
                self.output_format = format;
                self
            }

            /// Order being queried.
            #[must_use]
            pub fn order_id(&self) -> &str {
                &self.order_id
            }
        }

        impl Operation for $name {
            fn method(&self) -> &'static str {
                $method
            }

            fn output_format(&self) -> ResponseFormat {
                self.output_format
            }

            fn validate(&self, config: &IpcConfig) -> Result<()> {
                check_config(config)?;
                check_required(&self.order_id, "Invalid OrderId")?;
                check_output_format(self.output_format)
            }

            fn write_fields(
                &self,
                _config: &IpcConfig,
                request: &mut RequestAssembler,
            ) -> Result<()> {
                request
                    .add_field("OrderID", &self.order_id, false)?
                    .add_field("OutputFormat", self.output_format.as_str(), false)?;
                Ok(())
            }
        }
    };
}

order_query!(
    /// Status of the last transaction for an order (`IPCGetTxnStatus`).
    GetTxnStatus,
    "IPCGetTxnStatus"
);

order_query!(
    /// Payment status of an order (`IPCGetPaymentStatus`).
    GetPaymentStatus,
    "IPCGetPaymentStatus"
);

order_query!(
    /// Transaction log of an order (`IPCGetTxnLog`).
    GetTxnLog,
    "IPCGetTxnLog"
);
