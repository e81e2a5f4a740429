//! Host array arguments.

use crate::error::{IndexError, IndexResult};

/// An array value handed over by the host.
///
/// Arrays may carry NULL elements and more than one dimension; operators
/// that need a plain list check the shape with [`ArrayArg::plain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayArg<T> {
    ndims: usize,
    elems: Vec<Option<T>>,
}

impl<T> ArrayArg<T> {
    /// A one-dimensional array (zero-dimensional when empty).
    pub fn new(elems: Vec<Option<T>>) -> Self {
        let ndims = usize::from(!elems.is_empty());
        Self { ndims, elems }
    }

    /// An array with an explicit number of dimensions; elements are given
    /// in storage order.
    pub fn with_dims(ndims: usize, elems: Vec<Option<T>>) -> Self {
        Self { ndims, elems }
    }

    /// Number of dimensions.
    pub fn ndims(&self) -> usize {
        self.ndims
    }

    /// Number of elements, NULLs included.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Iterates over the elements, NULLs included.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> {
        self.elems.iter().map(Option::as_ref)
    }

    /// Iterates over the non-NULL elements.
    pub fn non_null(&self) -> impl Iterator<Item = &T> {
        self.elems.iter().flatten()
    }

    /// Checks that the array is one-dimensional without NULLs and returns
    /// its elements.
    pub fn plain(&self) -> IndexResult<Vec<&T>> {
        if self.ndims > 1 {
            return Err(IndexError::ArrayNotOneDimensional);
        }
        self.elems
            .iter()
            .map(|e| e.as_ref().ok_or(IndexError::ArrayContainsNulls))
            .collect()
    }
}

impl<T> FromIterator<T> for ArrayArg<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Some).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_follow_content() {
        let empty: ArrayArg<i32> = ArrayArg::new(vec![]);
        assert_eq!(empty.ndims(), 0);
        let one: ArrayArg<i32> = [1, 2].into_iter().collect();
        assert_eq!(one.ndims(), 1);
        assert_eq!(one.plain().unwrap(), vec![&1, &2]);
    }

    #[test]
    fn shape_errors() {
        let nulls = ArrayArg::new(vec![Some(1), None]);
        assert_eq!(nulls.plain(), Err(IndexError::ArrayContainsNulls));
        assert_eq!(nulls.non_null().count(), 1);

        let matrix = ArrayArg::with_dims(2, vec![Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(matrix.plain(), Err(IndexError::ArrayNotOneDimensional));
    }
}
