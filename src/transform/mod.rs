//! Type-strengthening rewrites.
//!
//! A [`Pass`] looks at one node at a time; [`rewrite_bottom_up`] walks the
//! tree and hands every node to the pass after its children were rewritten.
//! Passes can't fail: when a rewrite isn't provably safe, the node is
//! returned as is.

use crate::{
    ast::Type,
    samples::{Segment, TypePath},
};

pub mod keyed_list;
pub mod substructure;

pub use keyed_list::KeyedLists;
pub use substructure::{Convention, Substructures};

pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrites a single node. Its children were already rewritten.
    fn rewrite(&self, ty: Type, path: &TypePath) -> Type;
}

/// Applies `pass` to every node of `ty`, children first.
pub fn rewrite_bottom_up<P: Pass + ?Sized>(pass: &P, ty: Type, path: &mut TypePath) -> Type {
    let ty = match ty {
        Type::Scalar(_) => ty,
        Type::Optional(inner) => Type::optional(rewrite_bottom_up(pass, *inner, path)),
        Type::List(element) => {
            path.push(Segment::Element);
            let element = rewrite_bottom_up(pass, *element, path);
            path.pop();
            Type::list(element)
        }
        Type::Record(record) => Type::Record(record.map_types(|label, ty| {
            path.push(Segment::Field(label.clone()));
            let ty = rewrite_bottom_up(pass, ty, path);
            path.pop();
            ty
        })),
    };
    pass.rewrite(ty, path)
}

/// An ordered sequence of passes. An empty pipeline returns its input
/// unchanged.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    /// Appends a pass, to run after the ones already added.
    #[must_use]
    pub fn with(mut self, pass: impl Pass + 'static) -> Pipeline {
        self.push(pass);
        self
    }

    pub fn push(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|p| p.name())
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn run(&self, mut ty: Type) -> Type {
        for pass in &self.passes {
            let _span = tracing::debug_span!("pass", name = pass.name()).entered();
            ty = rewrite_bottom_up(pass.as_ref(), ty, &mut TypePath::root());
        }
        ty
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.pass_names()).finish()
    }
}
