//! Stacking-order operations.
//!
//! All z-index arithmetic lives here. Given a set of elements with distinct
//! z-indices, every operation leaves them distinct and never negative.
//! Operations return `Ok(false)` when the element is already where the
//! operation would put it.

use std::collections::HashSet;

use crate::{CanvasError, CanvasResult, Element, ElementId};

/// z-index for an element appended on top of `elements`.
#[must_use]
pub fn next_z(elements: &[Element]) -> i32 {
    elements
        .iter()
        .map(|e| e.z_index)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// True when no two elements share a z-index.
#[must_use]
pub fn is_unique(elements: &[Element]) -> bool {
    let mut seen = HashSet::with_capacity(elements.len());
    elements.iter().all(|e| seen.insert(e.z_index))
}

/// Renumber `0..n` in paint order when any z-index is shared or negative.
///
/// Returns `true` when the elements were renumbered.
pub fn make_unique(elements: &mut [Element]) -> bool {
    if is_unique(elements) && elements.iter().all(|e| e.z_index >= 0) {
        return false;
    }
    let mut order: Vec<usize> = (0..elements.len()).collect();
    order.sort_by_key(|&i| elements[i].z_index);
    for (z, index) in (0_i32..).zip(order) {
        elements[index].z_index = z;
    }
    true
}

/// Swap with the nearest element strictly above.
///
/// # Errors
///
/// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
pub fn bring_forward(elements: &mut [Element], id: &ElementId) -> CanvasResult<bool> {
    let index = index_of(elements, id)?;
    let current = elements[index].z_index;
    let neighbour = elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.z_index > current)
        .min_by_key(|(_, e)| e.z_index)
        .map(|(i, _)| i);
    Ok(swap_with(elements, index, neighbour))
}

/// Swap with the nearest element strictly below.
///
/// # Errors
///
/// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
pub fn send_backward(elements: &mut [Element], id: &ElementId) -> CanvasResult<bool> {
    let index = index_of(elements, id)?;
    let current = elements[index].z_index;
    let neighbour = elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.z_index < current)
        .max_by_key(|(_, e)| e.z_index)
        .map(|(i, _)| i);
    Ok(swap_with(elements, index, neighbour))
}

/// Move above every other element (`max + 1`).
///
/// # Errors
///
/// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
pub fn bring_to_front(elements: &mut [Element], id: &ElementId) -> CanvasResult<bool> {
    let index = index_of(elements, id)?;
    let current = elements[index].z_index;
    let others_max = elements
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != index)
        .map(|(_, e)| e.z_index)
        .max();
    match others_max {
        Some(max) if max >= current => {
            elements[index].z_index = max.saturating_add(1);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Move to `0` and shift every other element up by one.
///
/// # Errors
///
/// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
pub fn send_to_back(elements: &mut [Element], id: &ElementId) -> CanvasResult<bool> {
    let index = index_of(elements, id)?;
    let already_back = elements[index].z_index == 0
        && elements
            .iter()
            .enumerate()
            .all(|(i, e)| i == index || e.z_index > 0);
    if already_back {
        return Ok(false);
    }
    for (i, element) in elements.iter_mut().enumerate() {
        if i == index {
            element.z_index = 0;
        } else if element.z_index >= 0 {
            element.z_index = element.z_index.saturating_add(1);
        }
    }
    Ok(true)
}

fn index_of(elements: &[Element], id: &ElementId) -> CanvasResult<usize> {
    elements
        .iter()
        .position(|e| &e.id == id)
        .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))
}

fn swap_with(elements: &mut [Element], index: usize, neighbour: Option<usize>) -> bool {
    let Some(neighbour) = neighbour else {
        return false;
    };
    let z = elements[index].z_index;
    elements[index].z_index = elements[neighbour].z_index;
    elements[neighbour].z_index = z;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementType;

    fn stack(zs: &[i32]) -> Vec<Element> {
        zs.iter()
            .map(|&z| Element::default_of(ElementType::Shape, z))
            .collect()
    }

    fn paint_order(elements: &[Element]) -> Vec<ElementId> {
        let mut sorted: Vec<&Element> = elements.iter().collect();
        sorted.sort_by_key(|e| e.z_index);
        sorted.into_iter().map(|e| e.id.clone()).collect()
    }

    fn zs(elements: &[Element]) -> Vec<i32> {
        elements.iter().map(|e| e.z_index).collect()
    }

    #[test]
    fn test_bring_forward_swaps_with_next_distinct_value() {
        let mut elements = stack(&[0, 5, 9]);
        let id = elements[0].id.clone();

        assert!(bring_forward(&mut elements, &id).expect("exists"));
        assert_eq!(zs(&elements), vec![5, 0, 9]);

        assert!(bring_forward(&mut elements, &id).expect("exists"));
        assert_eq!(zs(&elements), vec![9, 0, 5]);

        assert!(!bring_forward(&mut elements, &id).expect("exists"));
    }

    #[test]
    fn test_send_backward_at_bottom_is_noop() {
        let mut elements = stack(&[3, 7]);
        let id = elements[0].id.clone();
        assert!(!send_backward(&mut elements, &id).expect("exists"));
        assert_eq!(zs(&elements), vec![3, 7]);
    }

    #[test]
    fn test_bring_to_front() {
        let mut elements = stack(&[0, 1, 2]);
        let bottom = elements[0].id.clone();
        let top = elements[2].id.clone();

        assert!(!bring_to_front(&mut elements, &top).expect("exists"));
        assert!(bring_to_front(&mut elements, &bottom).expect("exists"));
        assert_eq!(zs(&elements), vec![3, 1, 2]);
    }

    #[test]
    fn test_send_to_back_shifts_everyone_including_zero() {
        let mut elements = stack(&[0, 1, 2]);
        let top = elements[2].id.clone();

        assert!(send_to_back(&mut elements, &top).expect("exists"));
        assert_eq!(zs(&elements), vec![1, 2, 0]);
        assert!(is_unique(&elements));
        assert_eq!(paint_order(&elements)[0], top);

        assert!(!send_to_back(&mut elements, &top).expect("exists"));
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let mut elements = stack(&[0]);
        let missing = ElementId::new();
        assert!(matches!(
            bring_forward(&mut elements, &missing),
            Err(CanvasError::ElementNotFound(_))
        ));
        assert!(send_to_back(&mut elements, &missing).is_err());
    }

    #[test]
    fn test_make_unique_renumbers_in_paint_order() {
        let mut elements = stack(&[4, 4, -2, 9]);
        let before = paint_order(&elements);

        assert!(make_unique(&mut elements));
        assert_eq!(zs(&elements), vec![1, 2, 0, 3]);
        assert_eq!(paint_order(&elements), before);
        assert!(!make_unique(&mut elements));
    }

    #[test]
    fn test_next_z() {
        assert_eq!(next_z(&[]), 0);
        assert_eq!(next_z(&stack(&[2, 7, 3])), 8);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Forward,
            Backward,
            Front,
            Back,
        }

        fn arb_op() -> impl Strategy<Value = (Op, usize)> {
            (
                prop_oneof![
                    Just(Op::Forward),
                    Just(Op::Backward),
                    Just(Op::Front),
                    Just(Op::Back),
                ],
                0usize..16,
            )
        }

        fn arb_unique_zs() -> impl Strategy<Value = Vec<i32>> {
            prop::collection::hash_set(0i32..1000, 1..16).prop_map(|set| set.into_iter().collect())
        }

        proptest! {
            #[test]
            fn prop_operations_keep_z_indices_unique(
                initial in arb_unique_zs(),
                ops in prop::collection::vec(arb_op(), 0..32)
            ) {
                let mut elements = stack(&initial);
                for (op, pick) in ops {
                    let id = elements[pick % elements.len()].id.clone();
                    let result = match op {
                        Op::Forward => bring_forward(&mut elements, &id),
                        Op::Backward => send_backward(&mut elements, &id),
                        Op::Front => bring_to_front(&mut elements, &id),
                        Op::Back => send_to_back(&mut elements, &id),
                    };
                    prop_assert!(result.is_ok());
                    prop_assert!(is_unique(&elements), "duplicate z after {:?}: {:?}", op, zs(&elements));
                    prop_assert!(elements.iter().all(|e| e.z_index >= 0));
                }
            }

            #[test]
            fn prop_forward_then_backward_restores_paint_order(
                initial in arb_unique_zs(),
                pick in 0usize..16
            ) {
                let mut elements = stack(&initial);
                let id = elements[pick % elements.len()].id.clone();
                let before = paint_order(&elements);

                if bring_forward(&mut elements, &id).expect("exists") {
                    send_backward(&mut elements, &id).expect("exists");
                }
                prop_assert_eq!(paint_order(&elements), before);
            }

            #[test]
            fn prop_send_to_back_puts_element_first(
                initial in arb_unique_zs(),
                pick in 0usize..16
            ) {
                let mut elements = stack(&initial);
                let id = elements[pick % elements.len()].id.clone();
                let others_before: Vec<ElementId> = paint_order(&elements)
                    .into_iter()
                    .filter(|other| other != &id)
                    .collect();

                send_to_back(&mut elements, &id).expect("exists");

                let after = paint_order(&elements);
                prop_assert_eq!(&after[0], &id);
                prop_assert_eq!(&after[1..], &others_before[..]);
                prop_assert!(is_unique(&elements));
            }
        }
    }
}
