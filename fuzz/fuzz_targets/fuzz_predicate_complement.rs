#![no_main]

use arbitrary::Arbitrary;
use fieldstream_core::{Field, Inclusion};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    values: Vec<Option<i64>>,
    start: i64,
    end: i64,
    inclusion: u8,
    set: Vec<i64>,
    pivot: i64,
}

fn inclusion(tag: u8) -> Inclusion {
    match tag % 4 {
        0 => Inclusion::Open,
        1 => Inclusion::Closed,
        2 => Inclusion::StartOpen,
        _ => Inclusion::EndOpen,
    }
}

fuzz_target!(|input: Input| {
    let Ok(field) = Field::builder("row", "value")
        .nullable_getter(|v: &Option<i64>| *v)
        .build()
    else {
        return;
    };
    let field: Field<Option<i64>, i64> = field;
    let inclusion = inclusion(input.inclusion);
    let pairs = [
        (field.equal(input.pivot), field.not_equal(input.pivot)),
        (field.greater_than(input.pivot), field.less_or_equal(input.pivot)),
        (field.less_than(input.pivot), field.greater_or_equal(input.pivot)),
        (
            field.between(input.start, input.end, inclusion),
            field.not_between(input.start, input.end, inclusion),
        ),
        (
            field.is_in(input.set.iter().copied()),
            field.not_in(input.set.iter().copied()),
        ),
    ];

    for value in input.values.iter().take(256) {
        for (i, (positive, negative)) in pairs.iter().enumerate() {
            let negated = positive.clone().negate();
            // Comparisons reject null on both sides; the rest are exact complements.
            let exact = i == 0 || i >= 3;
            if value.is_some() || exact {
                assert_ne!(positive.test(value), negative.test(value));
                assert_eq!(negated.test(value), !positive.test(value));
            } else {
                assert!(!positive.test(value) && !negative.test(value));
            }
        }
    }
});
