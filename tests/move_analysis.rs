//! Integration tests for move analysis: ownership transfers, control-flow
//! merging, and Copy classification.

use zenc_lib::Compiler;

fn check(source: &str) -> (usize, Vec<String>) {
    let report = Compiler::new().check_string("test.zen", source).unwrap();
    let messages = report
        .diagnostics
        .iter()
        .map(|d| d.message.clone())
        .collect();
    (report.summary.move_violations, messages)
}

#[test]
fn use_after_move() {
    let (count, messages) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); let t: S = s; use(s); }",
    );
    assert_eq!(count, 1);
    assert_eq!(messages[0], "Use of moved value 's'");
}

#[test]
fn copy_type_is_never_moved() {
    let (count, _) = check("fn main() { let a: int = 5; let b: int = a; use(a); }");
    assert_eq!(count, 0);
}

#[test]
fn branch_merge_produces_maybe_moved() {
    let (count, messages) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); if cond { consume(s); } use(s); }",
    );
    assert_eq!(count, 1);
    assert_eq!(messages[0], "Use of moved value 's'");
}

#[test]
fn moves_in_all_branches_still_error_after_join() {
    let (count, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); \
         if cond { consume(s); } else { consume(s); } use(s); }",
    );
    assert_eq!(count, 1);
}

#[test]
fn diverging_branches_alone_are_clean() {
    let (count, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); \
         if cond { consume(s); } else { consume(s); } }",
    );
    assert_eq!(count, 0);
}

#[test]
fn reassignment_revalidates() {
    let (count, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); consume(s); s = make(); consume(s); }",
    );
    assert_eq!(count, 0);
}

#[test]
fn loop_body_move_is_visible_after_the_loop() {
    let (count, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); while go { consume(s); } use(s); }",
    );
    assert_eq!(count, 1);
}

#[test]
fn match_arm_move_is_merged() {
    let (count, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); \
         match tag { 0 => { consume(s); }, _ => { nothing(); }, } use(s); }",
    );
    assert_eq!(count, 1);
}

#[test]
fn explicit_copy_impl_suppresses_moves() {
    let (count, _) = check(
        "struct P { x: int }\n\
         impl Copy for P { }\n\
         fn main() { let a: P = make(); let b: P = a; use(a); }",
    );
    assert_eq!(count, 0);
}

#[test]
fn many_copy_uses_stay_clean() {
    let (count, _) = check(
        "fn main() { let a: int = 1;\n\
         let b: int = a + a;\n\
         let c: int = a * b;\n\
         use(a); use(a); use(b); use(c); }",
    );
    assert_eq!(count, 0);
}

#[test]
fn borrow_is_not_a_move() {
    let (count, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); let r: &S = &s; use(r); consume(s); }",
    );
    assert_eq!(count, 0);
}

#[test]
fn parameters_participate_in_move_tracking() {
    let (count, messages) = check(
        "struct S { f: int }\n\
         fn eat(s: S) { consume(s); consume(s); }",
    );
    assert_eq!(count, 1);
    assert_eq!(messages[0], "Use of moved value 's'");
}

#[test]
fn hints_accompany_move_diagnostics() {
    let report = Compiler::new()
        .check_string(
            "test.zen",
            "struct S { f: int }\n\
             fn main() { let s: S = make(); let t: S = s; use(s); }",
        )
        .unwrap();
    let d = &report.diagnostics[0];
    assert_eq!(
        d.hints,
        vec![
            "This type owns resources and cannot be implicitly copied".to_string(),
            "Consider using a reference ('&') to borrow the value instead".to_string(),
        ]
    );
}

#[test]
fn move_free_function_passes() {
    let (count, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); let r: &S = &s; use(r); }",
    );
    assert_eq!(count, 0);
}

#[test]
fn renaming_preserves_the_verdict() {
    let (count_a, _) = check(
        "struct S { f: int }\n\
         fn main() { let s: S = make(); if cond { consume(s); } use(s); }",
    );
    let (count_b, _) = check(
        "struct Box { f: int }\n\
         fn main() { let parcel: Box = make(); if cond { consume(parcel); } use(parcel); }",
    );
    assert_eq!(count_a, count_b);
}
