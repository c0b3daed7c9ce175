//! Provider key types for the container.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::{ClassRecipe, Injectable};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// A unique, symbol-like qualifier token.
///
/// Every call to [`Token::new`] mints a distinct token, even when two tokens
/// share a label. The label is only used for diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::Token;
///
/// let primary = Token::new("primary");
/// let other = Token::new("primary");
/// assert_ne!(primary, other);
/// assert_eq!(primary.label(), "primary");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Token {
    id: u64,
    label: &'static str,
}

impl Token {
    /// Mints a new token with the given diagnostic label.
    pub fn new(label: &'static str) -> Self {
        Self {
            id: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            label,
        }
    }

    /// Diagnostic label given at creation.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Disambiguates several providers registered for the same type.
///
/// A qualifier is either a plain name or a [`Token`]. A name and a token never
/// compare equal, even when the token label matches the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// String qualifier, compared by value
    Named(Cow<'static, str>),
    /// Token qualifier, compared by identity
    Token(Token),
}

impl Qualifier {
    /// Creates a named qualifier.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Qualifier::Named(name.into())
    }
}

impl From<&'static str> for Qualifier {
    fn from(name: &'static str) -> Self {
        Qualifier::Named(Cow::Borrowed(name))
    }
}

impl From<String> for Qualifier {
    fn from(name: String) -> Self {
        Qualifier::Named(Cow::Owned(name))
    }
}

impl From<Token> for Qualifier {
    fn from(token: Token) -> Self {
        Qualifier::Token(token)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Named(name) => f.write_str(name),
            Qualifier::Token(token) => write!(f, "Symbol({})", token.label),
        }
    }
}

/// Key for provider storage and lookup.
///
/// A key identifies a requested type plus an optional [`Qualifier`]. Identity
/// is the `TypeId` and the qualifier only; the type name is carried for
/// diagnostics and never takes part in comparison, so two distinct types with
/// the same rendered name never collide.
///
/// Keys built with [`Key::class`] additionally carry a constructor reference,
/// which lets the container build an unregistered type ad hoc.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Key, Qualifier};
///
/// let plain = Key::of::<u32>();
/// let port = Key::named::<u32>("port");
///
/// assert_ne!(plain, port);
/// assert_eq!(port, Key::of::<u32>().with_qualifier(Qualifier::named("port")));
/// assert_eq!(port.to_string(), "u32[port]");
/// ```
#[derive(Clone)]
pub struct Key {
    id: TypeId,
    name: &'static str,
    qualifier: Option<Qualifier>,
    recipe: Option<ClassRecipe>,
}

impl Key {
    /// Key for the unqualified type `T`.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            qualifier: None,
            recipe: None,
        }
    }

    /// Key for `T` qualified by name.
    pub fn named<T: 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of::<T>().with_qualifier(Qualifier::Named(name.into()))
    }

    /// Key for `T` with an arbitrary qualifier.
    pub fn qualified<T: 'static>(qualifier: impl Into<Qualifier>) -> Self {
        Self::of::<T>().with_qualifier(qualifier.into())
    }

    /// Key for `T` that also references its constructor.
    ///
    /// When nothing is registered under this key the container constructs `T`
    /// directly instead of failing with `MissingProvider`.
    pub fn class<T: Injectable>() -> Self {
        Self {
            recipe: Some(ClassRecipe::of::<T>()),
            ..Self::of::<T>()
        }
    }

    /// Returns the same key with `qualifier` attached.
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// Returns the same key with the optional qualifier replaced.
    pub fn with_optional_qualifier(mut self, qualifier: Option<Qualifier>) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// `TypeId` of the identified type.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name, as given by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Qualifier, if any.
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// True when this key can construct its type without a registration.
    pub fn is_constructible(&self) -> bool {
        self.recipe.is_some()
    }

    pub(crate) fn recipe(&self) -> Option<ClassRecipe> {
        self.recipe
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.qualifier == other.qualifier
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}[{}]", self.name, q),
            None => f.write_str(self.name),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("type", &self.name)
            .field("qualifier", &self.qualifier)
            .field("constructible", &self.recipe.is_some())
            .finish()
    }
}

/// Builds a `Vec<Key>` of unqualified keys, for explicit dependency lists.
///
/// ```rust
/// use ferrous_ioc::{keys, Key};
///
/// let deps = keys![u8, String];
/// assert_eq!(deps, vec![Key::of::<u8>(), Key::of::<String>()]);
/// ```
#[macro_export]
macro_rules! keys {
    ($($ty:ty),* $(,)?) => {
        vec![$($crate::Key::of::<$ty>()),*]
    };
}

/// Builds a `Vec<Key>` of constructor-carrying keys for
/// [`Injectable`](crate::Injectable) types.
///
/// A dependency declared this way is constructed ad hoc when nothing is
/// registered for it.
///
/// ```rust
/// use ferrous_ioc::{class_keys, Args, DiResult, Injectable, Key};
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn construct(_: &mut Args) -> DiResult<Self> { Ok(Clock) }
/// }
///
/// let deps = class_keys![Clock];
/// assert_eq!(deps, vec![Key::of::<Clock>()]);
/// assert!(deps[0].is_constructible());
/// ```
#[macro_export]
macro_rules! class_keys {
    ($($ty:ty),* $(,)?) => {
        vec![$($crate::Key::class::<$ty>()),*]
    };
}
