use crate::errors::Result;

/// Progress of a single remote read, as seen by a view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Load<T> {
    #[default]
    NotRequested,
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> Load<T> {
    pub fn begin(&mut self) {
        *self = Load::Pending;
    }

    pub fn resolve(&mut self, result: Result<T>) {
        *self = match result {
            Ok(value) => Load::Ready(value),
            Err(e) => Load::Failed(e.to_string()),
        };
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Load::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Load::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Load::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CookbookError;

    #[test]
    fn test_default_is_not_requested() {
        let load: Load<u8> = Load::default();
        assert_eq!(load, Load::NotRequested);
        assert!(load.ready().is_none());
        assert!(!load.is_pending());
    }

    #[test]
    fn test_begin_then_resolve_ok() {
        let mut load = Load::default();
        load.begin();
        assert!(load.is_pending());
        load.resolve(Ok(7));
        assert_eq!(load.ready(), Some(&7));
    }

    #[test]
    fn test_resolve_err_keeps_reason() {
        let mut load: Load<u8> = Load::Pending;
        load.resolve(Err(CookbookError::NotFound("Recipe with id x not found".into())));
        assert_eq!(load.error(), Some("Not found: Recipe with id x not found"));
        assert!(load.ready().is_none());
    }
}
