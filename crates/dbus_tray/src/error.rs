use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dbus connection error")]
    DbusError(#[from] zbus::Error),
    #[error("Object already exists at {0} on this connection")]
    ObjectExists(&'static str),
    #[error("{0} is not supported by this item")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for zbus::fdo::Error {
    fn from(e: Error) -> Self {
        match e {
            // shells tell "not supported" apart from a crash by the error name
            Error::Unsupported(method) => zbus::fdo::Error::UnknownMethod(format!("Unknown method {}", method)),
            e => zbus::fdo::Error::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unsupported_maps_to_unknown_method() {
        let e: zbus::fdo::Error = Error::Unsupported("Scroll").into();
        assert!(matches!(e, zbus::fdo::Error::UnknownMethod(msg) if msg.contains("Scroll")));

        let e: zbus::fdo::Error = Error::ObjectExists("/StatusNotifierItem").into();
        assert!(matches!(e, zbus::fdo::Error::Failed(_)));
    }
}
