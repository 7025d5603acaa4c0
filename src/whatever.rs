use std::{
    any::Any,
    fmt::{Debug, Display},
    ops::Deref,
};

/// Boxed metadata payload of a type the engine knows nothing about.
pub type BoxedWhatever = Box<dyn Whatever>;

/// Object safe stand-in for `Clone + Eq` on arbitrary metadata values.
///
/// Anything that is `Debug + Display + Clone + Eq` and `'static` can be stored
/// as [`MetaValue::Other`](crate::metadata::MetaValue::Other). Two boxed values
/// compare equal only if they have the same concrete type and are equal as
/// that type, so literal criteria work on custom values too.
pub trait Whatever: Any + Debug + Display + 'static {
    fn clone_whatever(&self) -> BoxedWhatever;
    fn eq_whatever(&self, other: &dyn Whatever) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T> Whatever for T
where
    T: Any + Debug + Display + Clone + Eq,
{
    fn clone_whatever(&self) -> BoxedWhatever {
        Box::new(self.clone())
    }

    fn eq_whatever(&self, other: &dyn Whatever) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map(|other| other == self)
            .unwrap_or(false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Whatever {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

impl Clone for BoxedWhatever {
    fn clone(&self) -> Self {
        self.deref().clone_whatever()
    }
}

impl PartialEq for BoxedWhatever {
    fn eq(&self, other: &Self) -> bool {
        self.deref().eq_whatever(other.deref())
    }
}

impl Eq for BoxedWhatever {}
