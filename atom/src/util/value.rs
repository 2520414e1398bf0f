use ordered_float::OrderedFloat;
use proptest::arbitrary::Arbitrary;
use smol_str::SmolStr;

use crate::arena::{NodeArena, NodeId};
use crate::node::{NodeValue, Resolve};
use crate::printer::{Print, Printer};
use crate::token::is_valid_name;
use crate::tree::{resolve, TreeError};

/// A tree of forms that owns all of its text.
///
/// Values compare structurally, which makes them the natural way to check the
/// shape of a parsed tree or to build one from Rust data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub name: Option<SmolStr>,
    pub data: Data,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Data {
    List(Vec<Value>),
    /// Several top-level forms.
    Root(Vec<Value>),
    Long(i64),
    Real(OrderedFloat<f64>),
    Text(SmolStr),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Data::List(items.into_iter().collect()).into()
    }

    pub fn root(items: impl IntoIterator<Item = Value>) -> Self {
        Data::Root(items.into_iter().collect()).into()
    }

    pub fn long(value: i64) -> Self {
        Data::Long(value).into()
    }

    pub fn real(value: f64) -> Self {
        Data::Real(OrderedFloat(value)).into()
    }

    pub fn text(text: impl Into<SmolStr>) -> Self {
        Data::Text(text.into()).into()
    }

    /// The same value under a name.
    pub fn named(self, name: impl Into<SmolStr>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        Self { name: None, data }
    }
}

/// Only an unnamed root at the top prints without brackets; a root nested in
/// another value is an ordinary list once it is part of a tree.
impl<C> Print<C> for Value {
    fn print<P: Printer<C>>(&self, printer: &mut P) -> Result<(), P::Error> {
        match &self.data {
            Data::Root(items) if self.name.is_none() => {
                items.iter().try_for_each(|item| print_nested::<C, _>(item, printer))
            }
            _ => print_nested::<C, _>(self, printer),
        }
    }
}

fn print_nested<C, P: Printer<C>>(value: &Value, printer: &mut P) -> Result<(), P::Error> {
    let name = value.name.as_deref();
    match &value.data {
        Data::List(items) | Data::Root(items) => printer.list(|printer| {
            if let Some(name) = name {
                printer.name(name)?;
            }
            items.iter().try_for_each(|item| print_nested::<C, _>(item, printer))
        }),
        Data::Long(long) => printer.atom(name, |printer| printer.long(*long)),
        Data::Real(real) => printer.atom(name, |printer| printer.real(real.into_inner())),
        Data::Text(text) => printer.atom(name, |printer| printer.text(text)),
    }
}

impl NodeArena {
    /// Copies the tree below `id` into a [`Value`].
    pub fn to_value<R: Resolve + ?Sized>(&self, id: NodeId, resolver: &R) -> Result<Value, TreeError> {
        let node = self.node(id)?;
        let name = match node.name() {
            Some(name) => Some(SmolStr::from(resolve(resolver, name)?)),
            None => None,
        };

        let data = match node.value() {
            NodeValue::List { is_root } => {
                let items = self
                    .children(id)
                    .map(|child| self.to_value(child, resolver))
                    .collect::<Result<Vec<_>, _>>()?;
                if *is_root {
                    Data::Root(items)
                } else {
                    Data::List(items)
                }
            }
            NodeValue::Long(value) => Data::Long(*value),
            NodeValue::Real(value) => Data::Real(OrderedFloat(*value)),
            NodeValue::Text(text) => Data::Text(resolve(resolver, text)?.into()),
        };
        Ok(Value { name, data })
    }

    /// Allocates a detached tree that mirrors `value`.
    ///
    /// Nothing is left behind in the arena when this fails.
    pub fn build(&mut self, value: &Value) -> Result<NodeId, TreeError> {
        self.build_at(value, 0)
    }

    fn build_at(&mut self, value: &Value, depth: usize) -> Result<NodeId, TreeError> {
        let limit = self.config().max_depth;
        if depth > limit {
            return Err(TreeError::TooDeep { limit });
        }
        let name = value.name.as_deref();
        let id = match &value.data {
            Data::Long(long) => self.new_long(name, *long)?,
            Data::Real(real) => self.new_real(name, real.into_inner())?,
            Data::Text(text) => self.new_text(name, text)?,
            Data::List(items) | Data::Root(items) => {
                let list = self.new_list(name)?;
                for item in items {
                    match self.build_at(item, depth + 1) {
                        Ok(child) => self.append(list, child),
                        Err(error) => {
                            self.release_tree(list);
                            return Err(error);
                        }
                    }
                }
                if matches!(value.data, Data::Root(_)) {
                    self[list].value = NodeValue::List { is_root: true };
                }
                list
            }
        };
        Ok(id)
    }
}

impl Arbitrary for Value {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    /// Values that read back as themselves: lists never have exactly one item,
    /// reals are whole or halves, and texts have no double quotes.
    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;

        let name = proptest::option::of(
            "[-+.a-zé_*/<>=!?][-+.a-z0-9é_*/<>=!?]{0,8}"
                .prop_filter("must read back as a name", |name| is_valid_name(name))
                .prop_map(SmolStr::from),
        );
        let data = proptest::prop_oneof![
            any::<i64>().prop_map(Data::Long),
            (-1000..1000i32, any::<bool>()).prop_map(|(whole, half)| {
                let fraction = if half { 0.5 } else { 0.0 };
                Data::Real(OrderedFloat(f64::from(whole) + fraction))
            }),
            "[^\"]{0,12}".prop_map(|text| Data::Text(text.into())),
        ];
        let leaf = (name.clone(), data).prop_map(|(name, data)| Value { name, data });

        leaf.prop_recursive(4, 64, 5, move |inner| {
            let items = proptest::prop_oneof![
                Just(Vec::new()),
                proptest::collection::vec(inner, 2..5),
            ];
            (name.clone(), items).prop_map(|(name, items)| Value {
                name,
                data: Data::List(items),
            })
        })
        .boxed()
    }
}

#[cfg(test)]
mod test {
    use super::{Data, Value};
    use crate::arena::{ArenaConfig, NodeArena};
    use crate::node::Owned;
    use crate::tree::TreeError;
    use crate::{from_str, to_string, to_string_pretty};
    use proptest::prelude::*;

    /// A single form, or several of them under a root.
    fn document() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<Value>(),
            proptest::collection::vec(any::<Value>(), 2..5).prop_map(Value::root),
        ]
    }

    fn read_back(text: &str) -> Value {
        let mut arena = NodeArena::new();
        let root = from_str(text, &mut arena).unwrap().unwrap();
        arena.to_value(root, &Owned).unwrap()
    }

    proptest! {
        #[test]
        fn print_then_parse(value in document()) {
            let text = to_string(&value, ()).unwrap();
            assert_eq!(value, read_back(&text));
        }

        #[test]
        fn pretty_print_then_parse(value in document(), width in 0..120usize) {
            let text = to_string_pretty(&value, width, ()).unwrap();
            assert_eq!(value, read_back(&text));
        }

        #[test]
        fn build_then_print(value in document()) {
            let mut arena = NodeArena::new();
            let id = arena.build(&value).unwrap();
            assert_eq!(
                to_string(&value, ()).unwrap(),
                to_string(arena.view(id), &Owned).unwrap()
            );
            assert_eq!(value, arena.to_value(id, &Owned).unwrap());
        }
    }

    #[test]
    fn parsed_tree_as_value() {
        let expected = Value::root([
            Value::list([Value::long(1), Value::real(2.5)]).named("point"),
            Value::text("label").named("name"),
            Value::list([]),
        ]);
        assert_eq!(expected, read_back("(point 1 2.5) (name \"label\") ()"));
    }

    #[test]
    fn failed_build_leaves_nothing_behind() {
        let value = Value::list([Value::long(1), Value::long(2).named("not valid")]);
        let mut arena = NodeArena::new();
        assert_eq!(
            Err(TreeError::InvalidName("not valid".into())),
            arena.build(&value)
        );
        assert!(arena.is_empty());
    }

    #[test]
    fn nested_root_prints_as_a_list() {
        let value = Value::root([
            Value::long(1),
            Value::root([Value::long(2), Value::long(3)]),
        ]);
        let mut arena = NodeArena::new();
        let id = arena.build(&value).unwrap();
        assert_eq!("1 (2 3)", to_string(&value, ()).unwrap());
        assert_eq!("1 (2 3)", to_string(arena.view(id), &Owned).unwrap());
        assert_eq!("(x 1)", to_string(Value::root([Value::long(1)]).named("x"), ()).unwrap());
    }

    #[test]
    fn build_respects_depth_limit() {
        let mut value = Value::long(1);
        for _ in 0..3 {
            value = Value::list([value, Value::long(0)]);
        }
        let mut arena = NodeArena::with_config(ArenaConfig {
            max_depth: 2,
            ..ArenaConfig::default()
        });
        assert_eq!(Err(TreeError::TooDeep { limit: 2 }), arena.build(&value));
        assert!(arena.is_empty());

        let mut arena = NodeArena::with_config(ArenaConfig {
            max_depth: 3,
            ..ArenaConfig::default()
        });
        let id = arena.build(&value).unwrap();
        assert_eq!(3, arena.height(id));
    }

    #[test]
    fn root_data_survives_build() {
        let value = Value::root([Value::long(1), Value::long(2)]);
        let mut arena = NodeArena::new();
        let id = arena.build(&value).unwrap();
        assert!(arena[id].is_root());
        assert!(matches!(
            arena.to_value(id, &Owned).unwrap().data,
            Data::Root(_)
        ));
    }
}
