
use _fixtures::{catalogue_spec, counter_spec, felts};
use rpp_wizard::iop::{CoinKind, ColumnKind, EvalPoint, QueryStatus};
use rpp_wizard::{Builder, DefinitionError, Expr};

#[test]
fn registries_expose_what_was_defined() {
    let spec = catalogue_spec(8);
    assert_eq!(spec.num_rounds(), 1);
    assert_eq!(spec.frozen_rounds(), 1);
    assert!(spec.applied_passes().is_empty());
    assert_eq!(spec.pending_queries().len(), spec.queries().len());

    let a = spec.column_id("a").unwrap();
    let info = spec.columns().get(a).unwrap();
    assert_eq!((info.size, info.round, info.kind), (8, 0, ColumnKind::Committed));
    let ones = spec.column_id("ones").unwrap();
    assert_eq!(spec.columns().get(ones).unwrap().kind, ColumnKind::Proof);
    let even = spec.column_id("even-rows").unwrap();
    assert_eq!(spec.precomputed(even).map(<[_]>::len), Some(8));

    let first = spec.queries().iter().next().map(|(_, q)| q.name.clone());
    assert_eq!(first.as_deref(), Some("a-is-small"));
    assert!(spec
        .queries()
        .iter()
        .all(|(_, q)| q.status == QueryStatus::Pending));
}

#[test]
fn coins_live_in_later_rounds() {
    let spec = Builder::define(|b| {
        let x = b.commit("x", 4)?;
        b.next_round();
        let z = b.coin("z")?;
        b.extension_coin("w")?;
        b.integer_coin("picks", 3, 4)?;
        b.global("shift", Expr::column(x) - Expr::coin(z))?;
        Ok(())
    })
    .unwrap();
    assert_eq!(spec.num_rounds(), 2);
    assert_eq!(spec.coins().in_round(1).count(), 3);
    let picks = spec.coin_id("picks").unwrap();
    assert_eq!(
        spec.coins().get(picks).unwrap().kind,
        CoinKind::Integers { count: 3, bound: 4 }
    );
    assert_eq!(spec.queries().get(spec.query_id("shift").unwrap()).unwrap().round, 1);
}

#[test]
fn column_sizes_must_be_powers_of_two() {
    for size in [0, 3, 12] {
        let err = Builder::define(|b| b.commit("x", size).map(drop)).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::InvalidSize {
                name: "x".into(),
                size
            }
        );
    }
    let err = Builder::define(|b| b.precomputed("table", felts(&[1, 2, 3])).map(drop)).unwrap_err();
    assert!(matches!(err, DefinitionError::InvalidSize { size: 3, .. }));
}

#[test]
fn expressions_cannot_mix_sizes() {
    let err = Builder::define(|b| {
        let x = b.commit("x", 8)?;
        let y = b.commit("y", 16)?;
        b.global("mixed", Expr::column(x) * Expr::column(y))?;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, DefinitionError::SizeMismatch { left: 8, right: 16, .. }));

    let err = Builder::define(|b| b.local("constant", Expr::constant(1)).map(drop)).unwrap_err();
    assert_eq!(err, DefinitionError::EmptyQuery { name: "constant".into() });
}

#[test]
fn expressions_only_take_field_coins() {
    let err = Builder::define(|b| {
        let x = b.commit("x", 8)?;
        b.next_round();
        let picks = b.integer_coin("picks", 2, 8)?;
        b.global("bad", Expr::column(x) - Expr::coin(picks))?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::CoinKind {
            name: "bad".into(),
            coin: "picks".into()
        }
    );
}

#[test]
fn integer_coins_need_a_range() {
    let err = Builder::define(|b| {
        b.commit("x", 8)?;
        b.next_round();
        b.integer_coin("none", 0, 8)?;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, DefinitionError::InvalidCoin { .. }));
}

#[test]
fn query_shapes_are_checked() {
    let err = Builder::define(|b| {
        let x = b.commit("x", 8)?;
        let y = b.commit("y", 8)?;
        let t = b.commit("t", 8)?;
        b.inclusion("arity", &[x, y], &[t])?;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, DefinitionError::ShapeMismatch { .. }));

    let err = Builder::define(|b| {
        let x = b.commit("x", 8)?;
        b.inner_product("alone", x, &[])?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err, DefinitionError::EmptyQuery { name: "alone".into() });

    let err = Builder::define(|b| {
        let x = b.commit("x", 8)?;
        b.range("empty-range", x, 0)?;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, DefinitionError::ShapeMismatch { .. }));

    let err = Builder::define(|b| {
        let x = b.commit("x", 8)?;
        b.local_opening("beyond", x, 8)?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::PositionOutOfRange {
            name: "x".into(),
            position: 8,
            size: 8
        }
    );

    let err = Builder::define(|b| {
        let x = b.commit("x", 8)?;
        b.univariate("nowhere", &[], EvalPoint::Constant(2u64.into()))?;
        b.univariate("fine", &[x], EvalPoint::Constant(2u64.into()))?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err, DefinitionError::EmptyQuery { name: "nowhere".into() });
}

#[test]
fn permutations_may_split_columns_unevenly() {
    let spec = Builder::define(|b| {
        let a = b.commit("a", 8)?;
        let b0 = b.commit("b0", 4)?;
        let b1 = b.commit("b1", 4)?;
        b.permutation("split", &[a], &[b0, b1])?;
        Ok(())
    });
    assert!(spec.is_ok());
}

#[test]
fn ids_of_another_specification_are_unknown() {
    let other = counter_spec();
    let foreign = other.column_id("x").unwrap();
    let err = Builder::define(|b| b.range("foreign", foreign, 4).map(drop)).unwrap_err();
    assert_eq!(
        err,
        DefinitionError::UnknownReference {
            name: "foreign".into(),
            what: "column"
        }
    );
}

#[test]
fn definitions_are_deterministic() {
    assert_eq!(catalogue_spec(16).fingerprint(), catalogue_spec(16).fingerprint());
    assert_ne!(catalogue_spec(16).fingerprint(), catalogue_spec(32).fingerprint());
}
