//! Boolean label queries (`ltxtquery`).

use super::label::LabelPattern;
use super::ternary::Ternary;
use super::walker::{BoolQuery, QueryExpr};
use crate::error::IndexResult;
use crate::options::LabelFold;
use crate::signature::Signature;
use crate::value::Ltree;

/// A boolean expression over label patterns, e.g. `Europe & Russia*@ & !Transportation`.
///
/// An atom holds when some label of the path matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ltxtquery {
    query: BoolQuery<LabelPattern>,
}

impl Ltxtquery {
    /// Wraps a validated boolean query.
    pub fn new(query: BoolQuery<LabelPattern>) -> Self {
        Self { query }
    }

    /// The underlying query.
    pub fn query(&self) -> &BoolQuery<LabelPattern> {
        &self.query
    }

    /// Exact evaluation against a path.
    pub fn matches(&self, path: &Ltree) -> IndexResult<bool> {
        let result = self.query.evaluate(true, |atom| {
            Ternary::from_bool(path.labels().iter().any(|label| atom.matches(label)))
        })?;
        Ok(result == Ternary::Yes)
    }

    /// Lossy evaluation against a signature.
    pub fn check_signature(&self, sign: &Signature, fold: LabelFold) -> IndexResult<Ternary> {
        self.query.evaluate(false, |atom| {
            if atom.can_look_sign(fold) {
                Ternary::from_bool(sign.has_token(fold.label_hash(atom.text())))
            } else {
                Ternary::Maybe
            }
        })
    }
}

impl From<QueryExpr<LabelPattern>> for Ltxtquery {
    fn from(expr: QueryExpr<LabelPattern>) -> Self {
        Self::new(expr.into_query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SigLen;

    type E = QueryExpr<LabelPattern>;

    fn p(s: &str) -> Ltree {
        s.parse().unwrap()
    }

    fn atom(text: &str) -> E {
        E::atom(LabelPattern::new(text))
    }

    #[test]
    fn exact_matching() {
        let query: Ltxtquery = E::and(
            atom("Europe"),
            E::and(
                E::atom(LabelPattern::new("russia").any_end().case_insensitive()),
                E::not(atom("Transportation")),
            ),
        )
        .into();
        assert!(query
            .matches(&p("Top.Europe.Russian_Federation.Cities"))
            .unwrap());
        assert!(!query
            .matches(&p("Top.Europe.Russia.Transportation"))
            .unwrap());
        assert!(!query.matches(&p("Top.Asia.Russia")).unwrap());
    }

    #[test]
    fn signature_evaluation() {
        let fold = LabelFold::Unicode;
        let siglen = SigLen::new(8).unwrap();
        let sign = Signature::from_tokens(siglen, p("a.b").label_hashes(fold));

        let present: Ltxtquery = E::or(atom("a"), atom("zz")).into();
        assert!(present.check_signature(&sign, fold).unwrap().is_possible());

        let not_absent: Ltxtquery = E::not(atom("a")).into();
        assert_eq!(
            not_absent.check_signature(&sign, fold).unwrap(),
            Ternary::Yes
        );

        let prefix: Ltxtquery = E::atom(LabelPattern::new("q").any_end()).into();
        assert_eq!(prefix.check_signature(&sign, fold).unwrap(), Ternary::Maybe);

        let empty = Signature::new(siglen);
        let absent: Ltxtquery = atom("a").into();
        assert_eq!(absent.check_signature(&empty, fold).unwrap(), Ternary::No);
    }
}
