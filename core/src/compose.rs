//! Right-to-left function composition.
//!
//! The general-purpose combinator reused to build the middleware pipeline:
//! `compose([f1, f2, f3])(x)` is `f1(f2(f3(x)))`.

/// Compose unary functions from right to left.
///
/// Given functions `f1, f2, …, fn`, produces one function `g` with
/// `g(x) = f1(f2(…fn(x)))`. An empty sequence yields the identity function;
/// a single function behaves exactly as that function (the fold adds no
/// observable wrapper). Purely structural; no error conditions.
///
/// Generic over the callable type so it works with plain closures as well as
/// boxed `FnOnce` trait objects, which is how the middleware pipeline
/// composes its `Dispatch -> Dispatch` wrappers.
///
/// # Example
///
/// ```
/// use uniflow_core::compose;
///
/// let add_one = |x: i64| x + 1;
/// let double = |x: i64| x * 2;
///
/// // Right to left: double runs first.
/// assert_eq!(compose(vec![add_one, double])(10), 21);
/// assert_eq!(compose(Vec::<fn(i64) -> i64>::new())(10), 10);
/// ```
pub fn compose<T, I>(funcs: I) -> impl FnOnce(T) -> T
where
    I: IntoIterator,
    I::IntoIter: DoubleEndedIterator,
    I::Item: FnOnce(T) -> T,
{
    move |arg| funcs.into_iter().rev().fold(arg, |acc, f| f(acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_composition_is_identity() {
        let funcs: Vec<fn(i64) -> i64> = vec![];
        assert_eq!(compose(funcs)(42), 42);
    }

    #[test]
    fn single_function_is_unchanged() {
        let triple = |x: i64| x * 3;
        assert_eq!(compose(vec![triple])(7), 21);
    }

    #[test]
    fn composition_runs_right_to_left() {
        // Tag application order onto a string: the rightmost tag lands first.
        let outer = |s: String| format!("outer({s})");
        let middle = |s: String| format!("middle({s})");
        let inner = |s: String| format!("inner({s})");

        let composed = compose(vec![
            Box::new(outer) as Box<dyn FnOnce(String) -> String>,
            Box::new(middle),
            Box::new(inner),
        ]);
        assert_eq!(composed("x".to_string()), "outer(middle(inner(x)))");
    }

    #[test]
    fn works_with_boxed_fn_once() {
        let captured = String::from("suffix");
        let append: Box<dyn FnOnce(String) -> String> = Box::new(move |s| s + &captured);
        let upper: Box<dyn FnOnce(String) -> String> =
            Box::new(|s: String| s.to_ascii_uppercase());

        // upper runs first (rightmost), then append.
        assert_eq!(compose(vec![append, upper])("ab".to_string()), "ABsuffix");
    }

    mod laws {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // compose(f1..fn)(x) == f1(f2(..fn(x))) for affine functions.
            #[test]
            fn matches_nested_application(
                coeffs in prop::collection::vec((-4_i64..=4, -50_i64..=50), 0..6),
                x in -100_i64..=100,
            ) {
                let funcs: Vec<Box<dyn FnOnce(i64) -> i64>> = coeffs
                    .iter()
                    .map(|&(a, b)| {
                        Box::new(move |v: i64| a * v + b) as Box<dyn FnOnce(i64) -> i64>
                    })
                    .collect();

                let composed = compose(funcs)(x);

                let expected = coeffs
                    .iter()
                    .rev()
                    .fold(x, |acc, &(a, b)| a * acc + b);

                prop_assert_eq!(composed, expected);
            }
        }
    }
}
