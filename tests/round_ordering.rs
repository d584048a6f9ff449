
use _fixtures::fast_params;
use proptest::prelude::*;
use rpp_wizard::field::FieldElement;
use rpp_wizard::iop::{Builder, Expr, Specification};
use rpp_wizard::prover::prove_audited;
use rpp_wizard::transcript::{TranscriptEvent, TranscriptLabel};
use rpp_wizard::{Pipeline, ProverOptions, Witness};

#[derive(Debug, Clone)]
struct Shape {
    log_rows: u32,
    columns_per_round: Vec<usize>,
    permute_first_round: bool,
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    (2u32..=4, prop::collection::vec(1usize..=3, 1..=3), any::<bool>()).prop_map(
        |(log_rows, columns_per_round, permute_first_round)| Shape {
            log_rows,
            columns_per_round,
            permute_first_round,
        },
    )
}

fn column_name(round: usize, index: usize) -> String {
    format!("c{round}_{index}")
}

/// Round `r > 0` draws a coin and ties its first column to the previous
/// round's first column through it.
fn build(shape: &Shape) -> Specification {
    let rows = 1usize << shape.log_rows;
    Builder::define(|b| {
        let mut previous = None;
        for (round, &count) in shape.columns_per_round.iter().enumerate() {
            if round > 0 {
                b.next_round();
            }
            let coin = if round > 0 { Some(b.coin(&format!("coin{round}"))?) } else { None };
            let mut columns = Vec::with_capacity(count);
            for index in 0..count {
                columns.push(b.commit(&column_name(round, index), rows)?);
            }
            if let (Some(prev), Some(coin)) = (previous, coin) {
                b.global(
                    &format!("link{round}"),
                    Expr::column(columns[0]) - Expr::column(prev) * Expr::coin(coin),
                )?;
            }
            if round == 0 && shape.permute_first_round && count > 1 {
                b.permutation("shuffle", &[columns[0]], &[columns[1]])?;
            }
            previous = Some(columns[0]);
        }
        Ok(())
    })
    .unwrap()
}

fn witness(shape: &Shape, seed: u64) -> Witness {
    let rows = 1usize << shape.log_rows;
    let mut state = seed | 1;
    let mut witness = Witness::new();
    for (round, &count) in shape.columns_per_round.iter().enumerate() {
        for index in 0..count {
            let values = (0..rows)
                .map(|_| {
                    state = state.wrapping_mul(0x5851_f42d_4c95_7f2d).wrapping_add(0x1405_7b7e_f767_814f);
                    FieldElement::from(state >> 16)
                })
                .collect();
            witness.insert(&column_name(round, index), values);
        }
    }
    witness
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn coins_never_see_their_own_round(shape in arb_shape(), seed in any::<u64>()) {
        let compiled = Pipeline::commitment(fast_params()).compile(&build(&shape)).unwrap();
        let (_, events) = prove_audited(&compiled, &mut witness(&shape, seed), &ProverOptions::unchecked()).unwrap();

        let mut last_absorbed: Option<usize> = None;
        let mut draws = 0usize;
        for event in &events {
            match event {
                TranscriptEvent::Draw { round, name } => {
                    draws += 1;
                    prop_assert!(last_absorbed.map_or(true, |absorbed| absorbed < *round), "{name} drawn late");
                    let coin = compiled.coin_id(name).unwrap();
                    prop_assert_eq!(compiled.coins().get(coin).unwrap().round, *round);
                }
                TranscriptEvent::Absorb { round, label, name } => {
                    prop_assert!(last_absorbed.map_or(true, |absorbed| absorbed <= *round));
                    if matches!(label, TranscriptLabel::Message | TranscriptLabel::ColumnCommitment) {
                        let column = compiled.column_id(name).unwrap();
                        prop_assert_eq!(compiled.columns().get(column).unwrap().round, *round);
                    }
                    last_absorbed = Some(*round);
                }
                TranscriptEvent::Advance { .. } => {}
            }
        }
        prop_assert_eq!(draws, compiled.coins().len());
    }
}
