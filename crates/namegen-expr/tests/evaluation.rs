use std::collections::HashMap;

use chrono::NaiveDate;
use namegen_core::{CaseInsensitiveMap, Value};
use namegen_expr::{CounterPart, CounterPeriod, EvalContext, EvalError, Token, parse};

fn render(template: &str, context: &mut CaseInsensitiveMap<Value>) -> String {
    parse(template)
        .expect("parse")
        .eval(context)
        .expect("eval")
}

fn string_context() -> CaseInsensitiveMap<Value> {
    let mut context = CaseInsensitiveMap::new();
    context.insert("a", Value::from("A"));
    context.insert("b", Value::from(" B "));
    context.insert("empty", Value::from(""));
    context.insert("null", Value::Null);
    context.insert(
        "list",
        Value::List(vec![Value::from("a"), Value::from("b"), Value::from("c")]),
    );
    context
}

#[test]
fn default_trim_prefix_suffix_join() {
    let mut context = string_context();
    assert_eq!(
        render(
            "${null:defaultValue('foo')}|${empty:defaultValue('bar')}|${a:defaultValue('blee')}",
            &mut context
        ),
        "foo|bar|A"
    );
    assert_eq!(
        render("${b}|${b:trim}|${empty:trim}|${null:trim}", &mut context),
        " B |B||"
    );
    assert_eq!(
        render(
            "${a:prefix('!')}|${a:suffix('?')}|${null:suffix('#')}|${empty:suffix('*')}|${empty:defaultValue('foo'):suffix('@')}",
            &mut context
        ),
        "!A|A?|||foo@"
    );
    assert_eq!(
        render(
            "${a:join('-')}|${list:join('-')}|${list:join('_'):prefix('['):suffix(']')}|${empty:join('-')}|${null:join('-')}",
            &mut context
        ),
        "A|a-b-c|[a_b_c]||"
    );
}

#[test]
fn collection_formats() {
    let mut context = string_context();
    context.insert("empty", Value::List(Vec::new()));
    assert_eq!(render("${a:first}", &mut context), "A");
    assert_eq!(render("${null:first}|${empty:first}|${list:first}", &mut context), "||a");
    assert_eq!(
        render("${null:rest}|${empty:rest:join('-')}|${list:rest:join('-')}", &mut context),
        "||b-c"
    );
    assert_eq!(render("${null:last}|${empty:last}|${list:last}", &mut context), "||c");
}

#[test]
fn date_and_number_formats() {
    let ts = NaiveDate::from_ymd_opt(2011, 12, 3)
        .and_then(|d| d.and_hms_opt(8, 30, 15))
        .expect("timestamp");
    let mut context = CaseInsensitiveMap::new();
    context.insert("d", Value::Timestamp(ts));
    context.insert("n", Value::Float(123456.789));
    context.insert("s", Value::from("hello"));

    assert_eq!(render("${d}", &mut context), "2011-12-03 08:30:15");
    assert_eq!(render("${d:date}", &mut context), "20111203");
    assert_eq!(render("${d:date('yy-MM-dd')}", &mut context), "11-12-03");
    assert_eq!(render("${d:date('ISO_ORDINAL_DATE')}", &mut context), "2011-337");
    assert_eq!(render("${n:number('0.0000')}", &mut context), "123456.7890");
    assert_eq!(render("${n:number('000000000')}", &mut context), "000123457");
    assert_eq!(render("${n:number('abcde')}", &mut context), "abcde123457");

    let err = parse("${s:number('0000')}")
        .expect("parse")
        .eval(&mut context)
        .expect_err("non-numeric");
    assert!(matches!(err, EvalError::NotNumeric { .. }));
}

#[test]
fn missing_keys_render_blank_and_names_ignore_case() {
    let mut context = CaseInsensitiveMap::new();
    context.insert("SampleType", Value::from("Blood"));
    assert_eq!(render("${sampletype}-${nope}-x", &mut context), "Blood--x");
}

#[test]
fn min_value_passes_through() {
    let mut context = CaseInsensitiveMap::new();
    context.insert("genId", Value::Int(12));
    assert_eq!(render("G${genId:minValue(1000)}", &mut context), "G12");
}

#[derive(Default)]
struct CountingContext {
    values: CaseInsensitiveMap<Value>,
    counters: HashMap<String, i64>,
    days: HashMap<NaiveDate, i64>,
}

impl EvalContext for CountingContext {
    fn value(&self, token: &Token) -> Option<Value> {
        self.values.get(&token.key()).cloned()
    }

    fn sample_count(&mut self, period: CounterPeriod, date: NaiveDate) -> Result<i64, EvalError> {
        assert_eq!(period, CounterPeriod::Daily);
        let count = self.days.entry(date).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn counter_value(&mut self, counter: &CounterPart, prefix: &str) -> Result<i64, EvalError> {
        let floor = counter.start().map_or(0, |start| start - 1);
        let value = self
            .counters
            .entry(prefix.to_lowercase())
            .or_insert(floor);
        *value += 1;
        Ok(*value)
    }
}

#[test]
fn with_counter_prefixes_count_independently() {
    let mut context = CountingContext::default();
    context.values.insert("AliquotedFrom", Value::from("S100"));
    context.values.insert("SourceMeta", Value::from("mouse1"));

    let expr = parse("${${AliquotedFrom}.${SourceMeta}.:withCounter}").expect("parse");
    assert_eq!(expr.eval(&mut context).expect("first"), "S100.mouse1.1");
    assert_eq!(expr.eval(&mut context).expect("second"), "S100.mouse1.2");

    context.values.insert("SourceMeta", Value::from("mouse2"));
    assert_eq!(expr.eval(&mut context).expect("other prefix"), "S100.mouse2.1");

    let padded = parse("${${AliquotedFrom}...:withCounter(111, '0000')}").expect("parse");
    assert_eq!(padded.eval(&mut context).expect("padded"), "S100...0111");

    let trailing = parse("${${AliquotedFrom}-:withCounter}-${SourceMeta}-suffix").expect("parse");
    assert_eq!(trailing.eval(&mut context).expect("trailing"), "S100-1-mouse2-suffix");
}

#[test]
fn with_counter_blank_prefix_renders_blank() {
    let mut context = CountingContext::default();
    let expr = parse("${${AliquotedFrom}:withCounter}").expect("parse");
    assert_eq!(expr.eval(&mut context).expect("blank"), "");
    assert!(context.counters.is_empty());
}

#[test]
fn bound_sample_counter_uses_column_date() {
    let mut context = CountingContext::default();
    context
        .values
        .insert("received", Value::from("2024-01-05"));
    let expr = parse("S-${received:dailySampleCount}").expect("parse");
    assert_eq!(expr.eval(&mut context).expect("first"), "S-1");
    assert_eq!(expr.eval(&mut context).expect("second"), "S-2");

    context.values.insert("received", Value::Null);
    assert_eq!(expr.eval(&mut context).expect("null date"), "S-");
}

#[test]
fn plain_context_rejects_counters() {
    let mut context = CaseInsensitiveMap::new();
    context.insert("p", Value::from("X"));
    let err = parse("${${p}:withCounter}")
        .expect("parse")
        .eval(&mut context)
        .expect_err("no counters");
    assert!(matches!(err, EvalError::Counter(_)));
}
