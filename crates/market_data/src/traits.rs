use crate::remote::BridgeError;

/// Conversion from a bridge wire payload into a core model.
pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, BridgeError>;
}
