//! Waypoint town demo: blocking and tick-driven searches, closing a street
//! mid-game, nearest-waypoint lookup.
//!
//! Run: cargo run --bin waypoints

use std::cell::RefCell;
use std::rc::Rc;

use log::LevelFilter;
use rand::SeedableRng;
use waygraph_core::Position;
use waygraph_demos::{COLS, ROWS, SPACING, build_town, waypoint};
use waygraph_paths::{Execution, FinderConfig, PathFinder, Route};

fn describe(label: &str, route: Option<&Route>) {
    match route {
        Some(r) => println!("{label}: {r} (cost {:.1}, {} waypoints)", r.cost(), r.len()),
        None => println!("{label}: no route"),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let town = match build_town(&mut rng) {
        Ok(town) => town,
        Err(e) => {
            log::error!("cannot build the town: {e}");
            std::process::exit(1);
        }
    };
    let mut finder = PathFinder::new(town, FinderConfig::default().with_log_level(LevelFilter::Info));

    let from = waypoint(0, 0);
    let to = waypoint(COLS - 1, ROWS - 1);

    // Blocking request.
    let blocking: Rc<RefCell<Option<Route>>> = Rc::default();
    let slot = blocking.clone();
    finder.find_shortest_path(from, to, Execution::Synchronous, move |route| {
        *slot.borrow_mut() = route;
    });
    describe("synchronous", blocking.borrow().as_ref());

    // The same request, one step per tick.
    let ticked: Rc<RefCell<Option<Option<Route>>>> = Rc::default();
    let slot = ticked.clone();
    finder.find_shortest_path(from, to, Execution::Incremental, move |route| {
        *slot.borrow_mut() = Some(route);
    });
    let ticks = finder.run_until_idle(10_000);
    match ticked.borrow().as_ref() {
        Some(route) => describe(&format!("incremental ({ticks} ticks)"), route.as_ref()),
        None => println!("incremental: still running after {ticks} ticks"),
    }

    // Close a waypoint in the middle of the route and ask again.
    let closed = blocking
        .borrow()
        .as_ref()
        .and_then(|r| r.nodes().get(r.len() / 2).map(|n| n.id));
    if let Some(id) = closed {
        println!("closing waypoint {id}");
        finder.enable_node(id, false);
        describe("detour", finder.find_route(from, to).as_ref());
        if let Some(pos) = finder.graph().node(id).ok().map(|n| n.position) {
            match finder.graph().find_nearest_open_node(pos) {
                Some(open) => println!("nearest open waypoint to {id}: {open}"),
                None => println!("no open waypoint left"),
            }
        }
        finder.enable_node(id, true);
    }

    // Cancel a request halfway.
    let handle = finder.find_shortest_path(to, from, Execution::Incremental, |_| {
        println!("cancelled request must not call back");
    });
    for _ in 0..5 {
        finder.tick();
    }
    finder.cancel(&handle);
    println!("cancelled request {}, pending: {}", handle.id(), finder.pending());

    // Snap an arbitrary point to the graph.
    let probe = Position::new(SPACING * 3.4, SPACING * 5.6, 0.0);
    match finder.find_nearest_node(probe) {
        Some(id) => println!("nearest waypoint to {probe}: {id}"),
        None => println!("no waypoint near {probe}"),
    }
}
