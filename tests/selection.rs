use selection_dom::{
	memory::{MemoryTree, NodeId},
	selection::{append, attr, bind, bind_keyed, chain, classed, data, enter, exit, html, property, remove, select, select_all, sequence, static_, style, text},
	Error, Index, NodeSet, Property, Selection, SymbolGenerator, Tree as _, Value,
};

use memory_tree_::{datum, init_logging, list, outline};

type Program<D> = Selection<D, MemoryTree>;

fn run<D: 'static>(tree: &MemoryTree, program: &Program<D>, node: NodeId) -> Result<(), Error> {
	program.run(tree, NodeSet::single(tree.parent(&node), node), Index::LOCAL)
}

#[test]
fn sequence_applies_in_order() {
	init_logging();
	let tree = MemoryTree::new();
	let div = tree.append_child(&tree.body(), "div").unwrap();

	let program: Program<()> = sequence(attr("title", "first"), attr("title", "second"));
	run(&tree, &program, div).unwrap();

	assert_eq!(tree.attribute(&div, "title").as_deref(), Some("second"));
}

#[test]
fn sequence_continues_with_its_input() {
	let tree = MemoryTree::new();
	let div = tree.append_child(&tree.body(), "div").unwrap();

	let program: Program<()> = chain(sequence(append("a"), append("b")), classed("touched", true));
	run(&tree, &program, div).unwrap();

	assert_eq!(outline(&tree, &div), "div.touched(a b)");
}

#[test]
fn chain_is_associative() {
	init_logging();
	let build = || {
		let tree = MemoryTree::new();
		list(&tree, (), &[1, 2, 3]);
		tree.append_child(&tree.body(), "ol").unwrap();
		tree
	};
	let a = || select::<(), MemoryTree>("ul");
	let b = || select_all::<(), MemoryTree>("li");
	let c = || append::<(), MemoryTree>("span");

	let left_tree = build();
	let left = chain(chain(chain(a(), b()), c()), classed("last", true));
	run(&left_tree, &left, left_tree.body()).unwrap();

	let right_tree = build();
	let right = chain(chain(a(), chain(b(), c())), classed("last", true));
	run(&right_tree, &right, right_tree.body()).unwrap();

	assert_eq!(outline(&left_tree, &left_tree.body()), outline(&right_tree, &right_tree.body()));
	assert_eq!(
		outline(&left_tree, &left_tree.body()),
		"body(ul(li(span.last) li(span.last) li(span.last)) ol)"
	);
}

fn marking_join(on_enter_name: &'static str) -> Program<Vec<i32>> {
	chain(
		select_all("li"),
		bind(
			Vec::clone,
			chain(append(on_enter_name), classed("entered", true)),
			classed("updated", true),
			classed("exited", true),
		),
	)
}

#[test]
fn partition_sizes() {
	init_logging();
	for n in 0..=5 {
		for m in 0..=5 {
			let tree = MemoryTree::new();
			let existing: Vec<i32> = (1..=n).collect();
			let ul = list(&tree, (1..=m).collect::<Vec<i32>>(), &existing);
			run(&tree, &marking_join("li"), ul).unwrap();

			let count = |selector: &str| tree.select_all(&ul, selector).unwrap().len();
			let (n, m) = (n as usize, m as usize);
			assert_eq!(count(".entered"), m.saturating_sub(n), "enter for n = {}, m = {}", n, m);
			assert_eq!(count(".updated"), n.min(m), "update for n = {}, m = {}", n, m);
			assert_eq!(count(".exited"), n.saturating_sub(m), "exit for n = {}, m = {}", n, m);
			assert_eq!(count("li"), n.max(m), "total for n = {}, m = {}", n, m);
		}
	}
}

#[test]
fn join_rebinds_matched_elements() {
	let tree = MemoryTree::new();
	let ul = list(&tree, vec![7, 8], &[1, 2, 3]);
	let program: Program<Vec<i32>> = chain(
		select_all("li"),
		bind(
			Vec::clone,
			Selection::identity(),
			text(Value::computed(|d: &i32, _| d.to_string())),
			Selection::identity(),
		),
	);
	run(&tree, &program, ul).unwrap();

	let texts: Vec<_> = tree.children(&ul).iter().map(|li| tree.text(li)).collect();
	assert_eq!(texts, vec![Some("7".to_owned()), Some("8".to_owned()), None]);
}

#[test]
fn scenario_three_existing_five_new() {
	init_logging();
	let tree = MemoryTree::new();
	let ul = list(&tree, vec![1, 2, 3, 4, 5], &[10, 20, 30]);

	let program: Program<Vec<i32>> = chain(
		select_all("li"),
		bind(
			Vec::clone,
			append("span"),
			attr("class", Value::computed(|_: &i32, i| format!("row-{}", i))),
			remove(),
		),
	);
	run(&tree, &program, ul).unwrap();

	assert_eq!(outline(&tree, &ul), "ul(li.row-0 li.row-1 li.row-2 span span)");
	assert!(tree.children(&ul).iter().all(|child| tree.is_attached(child)));
}

#[test]
fn exit_partition_is_removed() {
	let tree = MemoryTree::new();
	let ul = list(&tree, vec![1], &[1, 2, 3]);
	let removed: Vec<_> = tree.children(&ul)[1..].to_vec();

	let program: Program<Vec<i32>> = chain(select_all("li"), bind(Vec::clone, append("li"), Selection::identity(), remove()));
	run(&tree, &program, ul).unwrap();

	assert_eq!(tree.children(&ul).len(), 1);
	assert!(removed.iter().all(|li| !tree.is_attached(li)));
}

#[test]
fn keyed_join_matches_by_key() {
	init_logging();
	let tree = MemoryTree::new();
	let ul = list(&tree, vec!["c", "d", "a"], &["a", "b", "c"]);
	let [a, b, c]: [_; 3] = tree.children(&ul).try_into().unwrap();

	let program: Program<Vec<&'static str>> = chain(
		select_all("li"),
		bind_keyed(
			Vec::clone,
			|d: &&str, _| (*d).to_owned(),
			chain(append("li"), classed("entered", true)),
			attr("data-position", Value::computed(|_: &&str, i| i.to_string())),
			classed("exited", true),
		),
	);
	run(&tree, &program, ul).unwrap();

	assert_eq!(tree.attribute(&c, "data-position").as_deref(), Some("0"));
	assert_eq!(tree.attribute(&a, "data-position").as_deref(), Some("2"));
	assert!(tree.has_class(&b, "exited"));
	assert_eq!(tree.select_all(&ul, ".entered").unwrap().len(), 1);
}

#[test]
fn keyed_join_duplicates() {
	let tree = MemoryTree::new();
	let ul = list(&tree, vec![1, 1], &[1, 1, 1]);

	let program: Program<Vec<i32>> = chain(
		select_all("li"),
		bind_keyed(
			Vec::clone,
			|d: &i32, _| d.to_string(),
			chain(append("li"), classed("entered", true)),
			classed("updated", true),
			classed("exited", true),
		),
	);
	run(&tree, &program, ul).unwrap();

	let count = |selector: &str| tree.select_all(&ul, selector).unwrap().len();
	assert_eq!(count(".updated"), 1);
	assert_eq!(count(".entered"), 1);
	assert_eq!(count(".exited"), 2);
}

#[test]
fn partition_accessors_inside_data() {
	let tree = MemoryTree::new();
	let ul = list(&tree, vec![1, 2], &[5, 6, 7]);

	let program: Program<Vec<i32>> = chain(
		select_all("li"),
		data(
			Vec::clone,
			sequence(
				sequence(chain(enter(), append("li")), classed("kept", true)),
				chain(exit(), remove()),
			),
		),
	);
	run(&tree, &program, ul).unwrap();

	assert_eq!(outline(&tree, &ul), "ul(li.kept li.kept)");
}

#[test]
fn partition_accessors_need_a_join() {
	let tree = MemoryTree::new();
	let div = tree.append_child(&tree.body(), "div").unwrap();

	assert_eq!(run(&tree, &enter::<(), _>(), div), Err(Error::NoJoin("enter")));
	assert_eq!(run(&tree, &exit::<(), _>(), div), Err(Error::NoJoin("exit")));
}

#[test]
fn static_is_idempotent() {
	init_logging();
	let tree = MemoryTree::new();
	let root = tree.append_child(&tree.body(), "div").unwrap();
	let symbols = SymbolGenerator::new();

	// The inner program overwrites the class attribute, which must not lose the tag.
	let program: Program<()> = static_(&symbols, "div", attr("class", "payload"));
	for _ in 0..3 {
		run(&tree, &program, root).unwrap();
	}

	assert_eq!(outline(&tree, &root), "div(div.payload.static-div-1)");
}

#[test]
fn static_tags_are_unique_per_construction() {
	let tree = MemoryTree::new();
	let root = tree.append_child(&tree.body(), "div").unwrap();
	let symbols = SymbolGenerator::new();

	let build = || static_::<(), MemoryTree>(&symbols, "g", Selection::identity());
	let program = sequence(build(), build());
	run(&tree, &program, root).unwrap();
	run(&tree, &program, root).unwrap();

	assert_eq!(outline(&tree, &root), "div(g.static-g-1 g.static-g-2)");
}

#[test]
fn static_children_follow_the_datum() {
	let tree = MemoryTree::new();
	let root = tree.append_child(&tree.body(), "div").unwrap();
	let symbols = SymbolGenerator::new();
	let program: Program<&'static str> = static_(&symbols, "h1", text(Value::computed(|d: &&str, _| (*d).to_owned())));

	tree.set_datum(&root, datum("first"));
	run(&tree, &program, root).unwrap();
	tree.set_datum(&root, datum("second"));
	run(&tree, &program, root).unwrap();

	let children = tree.children(&root);
	assert_eq!(children.len(), 1);
	assert_eq!(tree.text(&children[0]).as_deref(), Some("second"));
}

#[test]
fn static_pins_the_parent_index() {
	init_logging();
	let tree = MemoryTree::new();
	let ul = list::<_, i32>(&tree, vec![10, 20, 30, 40, 50], &[]);
	let symbols = SymbolGenerator::new();

	let index = || Value::computed(|_: &i32, i| i.to_string());
	let program: Program<Vec<i32>> = chain(
		select_all("li"),
		bind(
			Vec::clone,
			chain(
				append("li"),
				chain(static_(&symbols, "span", attr("data-inner", index())), attr("data-after", index())),
			),
			Selection::identity(),
			remove(),
		),
	);
	run(&tree, &program, ul).unwrap();

	let items = tree.children(&ul);
	assert_eq!(items.len(), 5);
	for (position, li) in items.iter().enumerate() {
		let span = tree.children(li)[0];
		assert_eq!(tree.attribute(&span, "data-inner"), Some(position.to_string()));
		assert_eq!(tree.attribute(li, "data-after"), Some(position.to_string()));
	}
}

#[test]
fn select_keeps_positions_and_propagates_data() {
	let tree = MemoryTree::new();
	let ul = list(&tree, "list", &["x", "y", "z"]);
	let items = tree.children(&ul);
	let bold = tree.append_child(&items[1], "b").unwrap();

	let program: Program<&'static str> = chain(
		select_all("li"),
		chain(select("b"), attr("title", Value::computed(|d: &&str, i| format!("{}{}", d, i)))),
	);
	run(&tree, &program, ul).unwrap();

	assert_eq!(tree.attribute(&bold, "title").as_deref(), Some("y1"));
	assert!(items.iter().all(|li| tree.attribute(li, "title").is_none()));
}

#[test]
fn setters() {
	let tree = MemoryTree::new();
	let div = tree.append_child(&tree.body(), "div").unwrap();
	let child = tree.append_child(&div, "p").unwrap();
	tree.set_datum(&div, datum(3.5_f64));

	let program: Program<f64> = sequence(
		sequence(
			style("opacity", Value::computed(|d: &f64, _| (d / 10.).to_string())),
			property("value", Value::computed(|d: &f64, _| Property::from(*d))),
		),
		sequence(classed("on", Value::computed(|d: &f64, _| *d > 1.)), html("<em>hi</em>")),
	);
	run(&tree, &program, div).unwrap();

	assert_eq!(tree.style(&div, "opacity").as_deref(), Some("0.35"));
	assert_eq!(tree.property(&div, "value"), Some(Property::Number(3.5)));
	assert!(tree.has_class(&div, "on"));
	assert_eq!(tree.html(&div).as_deref(), Some("<em>hi</em>"));
	assert!(!tree.is_attached(&child));
}

#[test]
fn errors_propagate() {
	let tree = MemoryTree::new();
	let div = tree.append_child(&tree.body(), "div").unwrap();
	let computed: Program<u8> = text(Value::computed(|d: &u8, _| d.to_string()));

	assert_eq!(run(&tree, &computed, div), Err(Error::MissingDatum));

	tree.set_datum(&div, datum("not a number"));
	assert!(matches!(run(&tree, &computed, div), Err(Error::DatumType { .. })));

	let constant: Program<u8> = text("fine");
	assert_eq!(run(&tree, &constant, div), Ok(()));

	let bad_selector: Program<()> = select("li:first-child");
	assert_eq!(run(&tree, &bad_selector, div), Err(Error::Selector("li:first-child".to_owned())));

	let bad_name: Program<()> = chain(append("not valid"), text("unreached"));
	assert_eq!(run(&tree, &bad_name, div), Err(Error::Element("not valid".to_owned())));
}

#[test]
fn building_has_no_effects() {
	let tree = MemoryTree::new();
	let symbols = SymbolGenerator::new();
	let _program: Program<()> = static_(&symbols, "div", chain(append("p"), remove()));
	assert!(tree.children(&tree.body()).is_empty());
}

#[test]
fn sequence_keeps_a_pinned_index() {
	let tree = MemoryTree::new();
	let ul = list::<_, i32>(&tree, vec![1, 2, 3], &[]);
	let symbols = SymbolGenerator::new();

	let index = || Value::computed(|_: &i32, i| i.to_string());
	let program: Program<Vec<i32>> = chain(
		select_all("li"),
		bind(
			Vec::clone,
			chain(append("li"), static_(&symbols, "span", sequence(attr("data-first", index()), attr("data-second", index())))),
			Selection::identity(),
			remove(),
		),
	);
	run(&tree, &program, ul).unwrap();

	for (position, li) in tree.children(&ul).iter().enumerate() {
		let span = tree.children(li)[0];
		assert_eq!(tree.attribute(&span, "data-first"), Some(position.to_string()));
		assert_eq!(tree.attribute(&span, "data-second"), Some(position.to_string()));
	}
}

#[test]
fn enter_sees_data_positions() {
	let tree = MemoryTree::new();
	let ul = list(&tree, vec![1, 2, 3, 4, 5], &[0, 0, 0]);

	let index = || Value::computed(|_: &i32, i| i.to_string());
	let program: Program<Vec<i32>> = chain(
		select_all("li"),
		bind(
			Vec::clone,
			chain(append("li"), attr("data-index", index())),
			attr("data-index", index()),
			remove(),
		),
	);
	run(&tree, &program, ul).unwrap();

	let indices: Vec<_> = tree.children(&ul).iter().map(|li| tree.attribute(li, "data-index")).collect();
	assert_eq!(indices, ["0", "1", "2", "3", "4"].iter().map(|i| Some((*i).to_owned())).collect::<Vec<_>>());
}

#[test]
fn keyed_join_exits_unbound_elements() {
	init_logging();
	let tree = MemoryTree::new();
	let ul = list(&tree, vec!["a"], &["a"]);
	let markup = tree.append_child(&ul, "li").unwrap();

	let program: Program<Vec<&'static str>> = chain(
		select_all("li"),
		bind_keyed(
			Vec::clone,
			|d: &&str, _| (*d).to_owned(),
			append("li"),
			classed("updated", true),
			remove(),
		),
	);
	run(&tree, &program, ul).unwrap();

	assert!(!tree.is_attached(&markup));
	assert_eq!(outline(&tree, &ul), "ul(li.updated)");
}
