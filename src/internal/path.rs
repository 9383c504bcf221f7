//! Persistent resolution path.

use std::fmt;
use std::rc::Rc;

use crate::descriptors::ServiceType;
use crate::key::ServiceKey;

struct Frame {
    key: ServiceKey,
    resolved: Option<ServiceType>,
    next: Option<Rc<Frame>>,
}

/// The chain of keys currently being constructed, innermost first.
///
/// Extending a path never mutates it, so sibling branches of a resolution
/// share their common prefix and cannot see each other's frames.
#[derive(Clone, Default)]
pub struct ResolutionPath {
    head: Option<Rc<Frame>>,
    len: usize,
}

impl ResolutionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new path with `key` pushed on top. `self` is unchanged.
    pub fn with_frame(&self, key: ServiceKey, resolved: Option<ServiceType>) -> Self {
        Self {
            head: Some(Rc::new(Frame {
                key,
                resolved,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn contains_key(&self, key: &ServiceKey) -> bool {
        self.frames().any(|frame| frame.key == *key)
    }

    /// Checks the resolved implementation of each frame, falling back to the key's type.
    pub fn contains_type(&self, service_type: &ServiceType) -> bool {
        self.frames().any(|frame| frame_type(frame) == service_type)
    }

    /// Types along the path, outermost first.
    pub fn types(&self) -> Vec<ServiceType> {
        let mut types: Vec<ServiceType> = self.frames().map(|frame| frame_type(frame).clone()).collect();
        types.reverse();
        types
    }

    pub fn type_names(&self) -> Vec<String> {
        self.types().iter().map(|ty| ty.name().to_string()).collect()
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.head.as_deref(), |frame| frame.next.as_deref())
    }
}

fn frame_type(frame: &Frame) -> &ServiceType {
    frame.resolved.as_ref().unwrap_or(frame.key.service_type())
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut frames: Vec<&Frame> = self.frames().collect();
        frames.reverse();
        for (index, frame) in frames.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            match &frame.resolved {
                Some(resolved) => write!(f, "{}:{}", frame.key, resolved)?,
                None => write!(f, "{}", frame.key)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolutionPath({self})")
    }
}
