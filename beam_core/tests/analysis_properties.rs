//! Whole-pipeline checks against closed-form beam results and statics.

use approx::{assert_abs_diff_eq, assert_relative_eq};

use beam_core::calculations::solve::{applied_resultant, LoadCaseResponse, LoadScope, StructureSolver, TypeResponse};
use beam_core::calculations::{
    analyze, build_model, solve_load_types, AnalysisOptions, ContinuousBeamAnalysis, ContinuousBeamInput, Model,
    PatternMode, SupportInput,
};
use beam_core::equations::{linear_load, split_at_zero_crossing, OneOrTwo};
use beam_core::loads::{DiscreteLoad, LoadType, NUM_LOAD_SLOTS};
use beam_core::Exact;

fn ex(s: &str) -> Exact {
    s.parse().unwrap()
}

fn beam(spans: &[&str], supports: &[&str]) -> ContinuousBeamInput {
    ContinuousBeamInput::from_codes(spans, supports).unwrap()
}

fn assert_equilibrium(model: &Model, slot: usize, scope: LoadScope, case: &LoadCaseResponse) {
    let (applied_force, applied_moment) = applied_resultant(model, slot, scope);
    let (reaction_force, reaction_moment) = case.reaction_resultant(model);
    assert_relative_eq!(reaction_force, applied_force, epsilon = 1e-8, max_relative = 1e-9);
    assert_relative_eq!(reaction_moment, -applied_moment, epsilon = 1e-7, max_relative = 1e-9);
}

#[test]
fn simple_span_point_load_matches_closed_form() {
    let input = beam(&["10"], &["p", "p"])
        .with_load(DiscreteLoad::point(LoadType::Dead, 1000.0, ex("5")).untyped());
    let analysis = analyze(&input, &AnalysisOptions::service()).unwrap();
    let env = &analysis.envelope;

    assert_relative_eq!(env.m_max.value, 2500.0, max_relative = 1e-12);
    assert_relative_eq!(env.m_max.x, 5.0, max_relative = 1e-12);
    assert_relative_eq!(env.v_max.value, 500.0, max_relative = 1e-12);
    assert_relative_eq!(env.v_min.value, -500.0, max_relative = 1e-12);

    let reactions = &analysis.solution.reactions;
    assert_relative_eq!(reactions[0].force[0], 500.0, max_relative = 1e-12);
    assert_relative_eq!(reactions[1].force[0], 500.0, max_relative = 1e-12);
}

#[test]
fn fixed_fixed_uniform_load_matches_closed_form() {
    // w = 12, L = 10: ends -wL²/12 = -100, midspan wL²/24 = 50
    let input = beam(&["10"], &["f", "f"]).with_load(DiscreteLoad::uniform(LoadType::Dead, 12.0).untyped());
    let analysis = analyze(&input, &AnalysisOptions::service()).unwrap();
    let env = &analysis.envelope;

    assert_eq!(analysis.model.beam.num_dof, 0);
    assert_relative_eq!(env.m_min.value, -100.0, max_relative = 1e-12);
    assert_relative_eq!(env.m_max.value, 50.0, max_relative = 1e-12);
    assert_relative_eq!(env.m_max.x, 5.0, max_relative = 1e-12);
    assert_relative_eq!(env.v_max.value, 60.0, max_relative = 1e-12);

    let reactions = &analysis.solution.reactions;
    assert_relative_eq!(reactions[0].moment[0], 100.0, max_relative = 1e-12);
    assert_relative_eq!(reactions[1].moment[0], -100.0, max_relative = 1e-12);
}

#[test]
fn every_load_case_is_in_equilibrium() {
    let mut input = beam(&["8", "12", "6"], &["p", "p", "s", "f"])
        .with_load(DiscreteLoad::uniform(LoadType::Dead, 2.0))
        .with_load(DiscreteLoad::point(LoadType::Live, 10.0, ex("3")))
        .with_load(DiscreteLoad::point(LoadType::Live, 7.5, ex("8")))
        .with_load(DiscreteLoad::partial_uniform(LoadType::Snow, 4.0, ex("10"), ex("26")))
        .with_load(DiscreteLoad::trapezoidal(LoadType::Wind, ex("4"), ex("14"), -3.0, 5.0))
        .with_load(DiscreteLoad::moment(LoadType::Seismic, 50.0, ex("10")))
        .with_load(DiscreteLoad::moment(LoadType::Seismic, -20.0, ex("20")));
    input.supports[2] = SupportInput::spring(500.0);

    let model = build_model(&input, &AnalysisOptions::default()).unwrap();
    let solution = solve_load_types(&model).unwrap();

    let mut checked = 0;
    for slot in 0..NUM_LOAD_SLOTS {
        match solution.response(slot) {
            Some(TypeResponse::Single(case)) => {
                assert_equilibrium(&model, slot, LoadScope::All, case);
                checked += 1;
            }
            Some(TypeResponse::Patterned { spans, nodes }) => {
                for (k, case) in spans.iter().enumerate() {
                    assert_equilibrium(&model, slot, LoadScope::Span(k), case);
                    checked += 1;
                }
                for (j, case) in nodes.iter().enumerate() {
                    if let Some(case) = case {
                        assert_equilibrium(&model, slot, LoadScope::Node(j), case);
                        checked += 1;
                    }
                }
            }
            None => {}
        }
    }
    assert_eq!(checked, solution.num_cases);
    assert!(solution.response(LoadType::Live.slot()).unwrap().is_patterned());
    assert!(!solution.response(LoadType::Wind.slot()).unwrap().is_patterned());
}

#[test]
fn unloaded_slot_gives_zero_displacements() {
    let input = beam(&["10", "10"], &["p", "p", "p"]).with_load(DiscreteLoad::uniform(LoadType::Dead, 5.0));
    let model = build_model(&input, &AnalysisOptions::default()).unwrap();
    let solver = StructureSolver::new(&model).unwrap();

    let case = solver.solve_case(LoadType::Seismic.slot(), LoadScope::All).unwrap();
    assert!(!case.displacements.is_empty());
    assert!(case.displacements.iter().all(|d| *d == 0.0));
    assert!(case.reactions.iter().all(|r| r.force == 0.0 && r.moment == 0.0));
}

#[test]
fn extra_cut_points_do_not_change_the_response() {
    let plain = beam(&["10", "15"], &["f", "p", "p"]).with_load(DiscreteLoad::uniform(LoadType::Dead, 3.0));
    let cut = beam(&["10", "15"], &["f", "p", "p"])
        .with_load(DiscreteLoad::partial_uniform(LoadType::Dead, 3.0, ex("0"), ex("10/3")))
        .with_load(DiscreteLoad::partial_uniform(LoadType::Dead, 3.0, ex("10/3"), ex("25")))
        .with_load(DiscreteLoad::point(LoadType::Wind, 40.0, ex("17.3")));

    let options = AnalysisOptions::default();
    let plain_model = build_model(&plain, &options).unwrap();
    let cut_model = build_model(&cut, &options).unwrap();
    assert!(cut_model.num_segments() > plain_model.num_segments());

    let dead = LoadType::Dead.slot();
    let a = solve_load_types(&plain_model).unwrap();
    let b = solve_load_types(&cut_model).unwrap();
    let (a, b) = match (a.response(dead), b.response(dead)) {
        (Some(TypeResponse::Single(a)), Some(TypeResponse::Single(b))) => (a.clone(), b.clone()),
        other => panic!("expected unpatterned dead responses, got {:?}", other),
    };

    for (x, y) in a.member_actions.iter().zip(&b.member_actions) {
        assert_abs_diff_eq!(x.left_shear, y.left_shear, epsilon = 1e-9);
        assert_abs_diff_eq!(x.left_moment, y.left_moment, epsilon = 1e-9);
        assert_abs_diff_eq!(x.right_shear, y.right_shear, epsilon = 1e-9);
        assert_abs_diff_eq!(x.right_moment, y.right_moment, epsilon = 1e-9);
    }
    for (x, y) in a.displacements.iter().zip(&b.displacements) {
        assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-9);
    }
}

fn combern_index(analysis: &ContinuousBeamAnalysis, combination: &str, pattern: usize) -> usize {
    analysis
        .envelope
        .comberns
        .iter()
        .find(|c| c.combination == combination && c.pattern == pattern)
        .map(|c| c.index)
        .unwrap()
}

#[test]
fn segment_actions_continue_across_a_cut() {
    // The wind point load adds a boundary at 17.3 but carries no factor in ASD-1
    let plain = beam(&["10", "15"], &["f", "p", "p"]).with_load(DiscreteLoad::uniform(LoadType::Dead, 3.0));
    let cut = plain.clone().with_load(DiscreteLoad::point(LoadType::Wind, 40.0, ex("17.3")));

    let plain = analyze(&plain, &AnalysisOptions::default()).unwrap();
    let cut = analyze(&cut, &AnalysisOptions::default()).unwrap();
    assert_eq!(plain.model.spans[1].segments.len(), 1);
    assert_eq!(cut.model.spans[1].segments.len(), 2);

    let c = combern_index(&plain, "ASD-1", 0);
    assert_eq!(combern_index(&cut, "ASD-1", 0), c);

    let whole = plain.state.segment(1, 0).actions[c];
    let left = cut.state.segment(1, 0).actions[c];
    let right = cut.state.segment(1, 1).actions[c];
    let x = cut.model.spans[1].segments[1].x_left;
    assert_relative_eq!(x, 7.3, max_relative = 1e-12);

    assert_relative_eq!(left.v1, whole.v1, epsilon = 1e-9, max_relative = 1e-9);
    assert_relative_eq!(left.m1, whole.m1, epsilon = 1e-9, max_relative = 1e-9);
    assert_relative_eq!(right.v1, whole.shear_at(x), epsilon = 1e-9, max_relative = 1e-9);
    assert_relative_eq!(right.m1, whole.moment_at(x), epsilon = 1e-9, max_relative = 1e-9);
    assert_relative_eq!(right.w1f, whole.w1f, epsilon = 1e-12);
}

#[test]
fn snow_pattern_half_loads_adjacent_spans() {
    let patterned = beam(&["10", "10", "10"], &["p", "p", "p", "p"])
        .with_load(DiscreteLoad::uniform(LoadType::Snow, 10.0));
    let patterned = analyze(&patterned, &AnalysisOptions::default()).unwrap();

    // Middle span loaded, outer spans at half intensity, written out directly
    let explicit = beam(&["10", "10", "10"], &["p", "p", "p", "p"])
        .with_load(DiscreteLoad::partial_uniform(LoadType::Snow, 5.0, ex("0"), ex("10")))
        .with_load(DiscreteLoad::partial_uniform(LoadType::Snow, 10.0, ex("10"), ex("20")))
        .with_load(DiscreteLoad::partial_uniform(LoadType::Snow, 5.0, ex("20"), ex("30")));
    let unpatterned = AnalysisOptions::default().with_patterning(PatternMode::None);
    let explicit = analyze(&explicit, &unpatterned).unwrap();

    let c = combern_index(&patterned, "ASD-3b", 2);
    assert_eq!(patterned.envelope.combern(c).unwrap().loaded_spans, vec![1]);
    let e = combern_index(&explicit, "ASD-3b", 0);

    for (k, w) in [(0, 5.0), (1, 10.0), (2, 5.0)] {
        let a = patterned.state.segment(k, 0).actions[c];
        let b = explicit.state.segment(k, 0).actions[e];
        assert_relative_eq!(a.w1f, w, max_relative = 1e-12);
        assert_relative_eq!(a.slope, 0.0);
        assert_relative_eq!(a.v1, b.v1, epsilon = 1e-9, max_relative = 1e-9);
        assert_relative_eq!(a.m1, b.m1, epsilon = 1e-9, max_relative = 1e-9);
    }

    // Half of each outer span's isolated case, all of the middle one
    let snow = match patterned.solution.response(LoadType::Snow.slot()) {
        Some(TypeResponse::Patterned { spans, .. }) => spans,
        other => panic!("expected a patterned snow response, got {:?}", other),
    };
    let left_shear = snow[1].member_actions[0].left_shear + 0.5 * (snow[0].member_actions[0].left_shear
        + snow[2].member_actions[0].left_shear);
    assert_relative_eq!(
        patterned.state.segment(0, 0).actions[c].v1,
        left_shear,
        epsilon = 1e-9,
        max_relative = 1e-9
    );
}

#[test]
fn positions_with_large_coprime_denominators_build() {
    let input = beam(&["10", "10"], &["p", "p", "p"])
        .with_load(DiscreteLoad::partial_uniform(LoadType::Dead, 4.0, ex("3/999999937"), ex("7/999999929")))
        .with_load(DiscreteLoad::point(LoadType::Dead, 100.0, ex("5/999999893")));
    let model = build_model(&input, &AnalysisOptions::default()).unwrap();

    assert_eq!(model.spans[0].segments.len(), 4);
    let x: Vec<f64> = model.spans[0].segments.iter().map(|s| s.x_left).collect();
    assert_relative_eq!(x[1], 3.0 / 999999937.0, max_relative = 1e-12);
    assert_relative_eq!(x[2], 5.0 / 999999893.0, max_relative = 1e-12);
    assert_relative_eq!(x[3], 7.0 / 999999929.0, max_relative = 1e-12);

    let solution = solve_load_types(&model).unwrap();
    match solution.response(LoadType::Dead.slot()) {
        Some(TypeResponse::Single(case)) => {
            assert_equilibrium(&model, LoadType::Dead.slot(), LoadScope::All, case)
        }
        other => panic!("expected an unpatterned dead response, got {:?}", other),
    }
}

#[test]
fn opposite_sign_linear_load_splits_continuously() {
    let (w1, w2, l) = (-10.0, 20.0, 10.0);
    match split_at_zero_crossing(w1, w2, l) {
        OneOrTwo::Two(left, right) => {
            assert_relative_eq!(left.end, 10.0 / 3.0, max_relative = 1e-12);
            assert_eq!(left.end, right.start);
            assert_eq!(left.w_end, 0.0);
            assert_eq!(right.w_start, 0.0);
            let resultant = 0.5 * (left.w_start * (left.end - left.start) + right.w_end * (right.end - right.start));
            assert_relative_eq!(resultant, 0.5 * (w1 + w2) * l, max_relative = 1e-12);
        }
        OneOrTwo::One(_) => panic!("expected a split"),
    }

    // Uniform w1 plus a triangle rising by (w2 - w1)
    let rise = w2 - w1;
    let expected_left_shear = w1 * l / 2.0 + 3.0 * rise * l / 20.0;
    let expected_right_shear = w1 * l / 2.0 + 7.0 * rise * l / 20.0;
    let expected_left_moment = w1 * l * l / 12.0 + rise * l * l / 30.0;
    let expected_right_moment = -(w1 * l * l / 12.0 + rise * l * l / 20.0);

    let fea = linear_load(w1, w2, 0.0, l, l);
    assert_relative_eq!(fea.left_shear, expected_left_shear, max_relative = 1e-10);
    assert_relative_eq!(fea.right_shear, expected_right_shear, max_relative = 1e-10);
    assert_relative_eq!(fea.left_moment, expected_left_moment, max_relative = 1e-10);
    assert_relative_eq!(fea.right_moment, expected_right_moment, max_relative = 1e-12);

    // Fixed-fixed: member actions are the fixed-end actions
    let input = beam(&["10"], &["f", "f"])
        .with_load(DiscreteLoad::trapezoidal(LoadType::Dead, ex("0"), ex("10"), w1, w2).untyped());
    let analysis = analyze(&input, &AnalysisOptions::service()).unwrap();
    let case = match analysis.solution.response(0) {
        Some(TypeResponse::Single(case)) => case,
        other => panic!("expected a single response, got {:?}", other),
    };
    let ends = case.member_actions[0];
    assert_relative_eq!(ends.left_shear, expected_left_shear, max_relative = 1e-10);
    assert_relative_eq!(ends.left_moment, expected_left_moment, max_relative = 1e-12);
    assert_relative_eq!(ends.right_shear, expected_right_shear, max_relative = 1e-12);
    assert_relative_eq!(ends.right_moment, expected_right_moment, max_relative = 1e-12);
}

#[test]
fn no_patternable_load_runs_one_pattern() {
    let input = beam(&["12", "12", "12"], &["p", "p", "p", "p"])
        .with_load(DiscreteLoad::uniform(LoadType::Dead, 1.5))
        .with_load(DiscreteLoad::uniform(LoadType::Wind, -0.8));
    let analysis = analyze(&input, &AnalysisOptions::default()).unwrap();
    let env = &analysis.envelope;

    assert_eq!(analysis.model.beam.num_patterns, 1);
    assert_eq!(analysis.state.num_comberns, env.num_combinations + 1);
    assert_eq!(env.comberns.len(), env.num_combinations);
    assert!(env.comberns.iter().all(|c| c.pattern == 0));
    assert_eq!(analysis.solution.num_cases, 3);
}

#[test]
fn simple_span_deflection_matches_closed_form() {
    // PL³/48EI with P = 1000, L = 120, EI = 29000 × 100
    let input = beam(&["120"], &["p", "p"])
        .with_section(29000.0, 100.0)
        .with_load(DiscreteLoad::point(LoadType::Dead, 1000.0, ex("60")).untyped());
    let analysis = analyze(&input, &AnalysisOptions::service()).unwrap();

    let expected = 1000.0 * 120f64.powi(3) / (48.0 * 29000.0 * 100.0);
    let min = analysis.envelope.deflection_min.unwrap();
    assert_relative_eq!(min.value, -expected, max_relative = 1e-9);
    assert_relative_eq!(min.x, 60.0, max_relative = 1e-9);
    assert_eq!(min.combination, Some(0));
}

#[test]
fn cantilever_uniform_tip_deflection() {
    // wL⁴/8EI with w = 12, L = 10, EI = 1e4
    let input = beam(&["10"], &["f", "c"])
        .with_section(1000.0, 10.0)
        .with_load(DiscreteLoad::uniform(LoadType::Dead, 12.0).untyped());
    let analysis = analyze(&input, &AnalysisOptions::service()).unwrap();

    let min = analysis.envelope.deflection_min.unwrap();
    assert_relative_eq!(min.value, -1.5, max_relative = 1e-9);
    assert_relative_eq!(min.x, 10.0, max_relative = 1e-12);
    assert_relative_eq!(analysis.envelope.m_min.value, -600.0, max_relative = 1e-12);
}
