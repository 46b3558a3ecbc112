//! Closure-based queries over archetypes.
//!
//! `world.query::<(&Transform, &mut GlobalTransform)>(|entity, (t, g)| ..)`
//! visits every archetype containing all requested types. Columns are pulled
//! out of the archetype's map for the duration of the visit so that `&A` and
//! `&mut B` borrow disjoint owned values, then put back.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::ComponentColumn;

/// Something a query can fetch per entity: `&T`, `&mut T`, or a tuple of those.
pub trait QueryParam {
    type Item<'w>;
    type Column;

    fn type_ids() -> Vec<TypeId>;
    fn extract(columns: &mut HashMap<TypeId, ComponentColumn>) -> Self::Column;
    fn restore(col: Self::Column, columns: &mut HashMap<TypeId, ComponentColumn>);
    fn fetch(col: &mut Self::Column, index: usize) -> Self::Item<'_>;
}

fn take_column<T: 'static>(columns: &mut HashMap<TypeId, ComponentColumn>) -> (TypeId, ComponentColumn) {
    let tid = TypeId::of::<T>();
    let col = columns.remove(&tid).unwrap_or_else(|| {
        panic!(
            "Query extract: column for `{}` not found in archetype",
            std::any::type_name::<T>()
        )
    });
    (tid, col)
}

impl<T: 'static + Send + Sync> QueryParam for &T {
    type Item<'w> = &'w T;
    type Column = (TypeId, ComponentColumn);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(columns: &mut HashMap<TypeId, ComponentColumn>) -> Self::Column {
        take_column::<T>(columns)
    }

    fn restore(col: Self::Column, columns: &mut HashMap<TypeId, ComponentColumn>) {
        columns.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, index: usize) -> Self::Item<'_> {
        col.1.get::<T>(index)
    }
}

impl<T: 'static + Send + Sync> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Column = (TypeId, ComponentColumn);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(columns: &mut HashMap<TypeId, ComponentColumn>) -> Self::Column {
        take_column::<T>(columns)
    }

    fn restore(col: Self::Column, columns: &mut HashMap<TypeId, ComponentColumn>) {
        columns.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, index: usize) -> Self::Item<'_> {
        col.1.get_mut::<T>(index)
    }
}

macro_rules! impl_query_param_tuple {
    ($($P:ident),+) => {
        impl<$($P: QueryParam),+> QueryParam for ($($P,)+) {
            type Item<'w> = ($($P::Item<'w>,)+);
            type Column = ($($P::Column,)+);

            fn type_ids() -> Vec<TypeId> {
                let mut ids = Vec::new();
                $(ids.extend($P::type_ids());)+
                ids
            }

            #[allow(non_snake_case)]
            fn extract(columns: &mut HashMap<TypeId, ComponentColumn>) -> Self::Column {
                ($($P::extract(columns),)+)
            }

            #[allow(non_snake_case)]
            fn restore(col: Self::Column, columns: &mut HashMap<TypeId, ComponentColumn>) {
                let ($($P,)+) = col;
                $($P::restore($P, columns);)+
            }

            #[allow(non_snake_case)]
            fn fetch(col: &mut Self::Column, index: usize) -> Self::Item<'_> {
                let ($($P,)+) = col;
                ($($P::fetch($P, index),)+)
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
