use eframe_studio::command::{Command, CommandContext};
use eframe_studio::scene::{Entity, ShapePayload};
use egui::{Color32, pos2, vec2};

fn new_editor() -> CommandContext {
    CommandContext::new().expect("fresh editor")
}

fn add_shape(ctx: &mut CommandContext, name: &str, x: f32, y: f32) {
    Command::AddShape {
        name: name.into(),
        shape: ShapePayload {
            width: 20.0,
            height: 20.0,
            fill: Color32::WHITE,
            stroke: Color32::BLACK,
            stroke_width: 1.0,
            dashed: false,
        },
        position: pos2(x, y),
    }
    .execute(ctx)
    .expect("add shape");
}

/// Entity names and positions in stacking order, used as a structural
/// fingerprint of the scene.
fn fingerprint(ctx: &CommandContext) -> Vec<(String, (f32, f32))> {
    ctx.scene
        .entities()
        .iter()
        .map(|e| (e.name.clone(), (e.position.x, e.position.y)))
        .collect()
}

#[test]
fn undo_redo_inverse_law() {
    let mut ctx = new_editor();
    let initial = fingerprint(&ctx);

    add_shape(&mut ctx, "a", 10.0, 10.0);
    add_shape(&mut ctx, "b", 50.0, 50.0);
    add_shape(&mut ctx, "c", 90.0, 90.0);
    let final_state = fingerprint(&ctx);

    for _ in 0..3 {
        Command::Undo.execute(&mut ctx).unwrap();
    }
    assert_eq!(fingerprint(&ctx), initial);

    for _ in 0..3 {
        Command::Redo.execute(&mut ctx).unwrap();
    }
    assert_eq!(fingerprint(&ctx), final_state);
}

#[test]
fn undo_steps_back_one_state_at_a_time() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    let after_one = fingerprint(&ctx);
    add_shape(&mut ctx, "b", 50.0, 50.0);

    Command::Undo.execute(&mut ctx).unwrap();
    assert_eq!(fingerprint(&ctx), after_one);
}

#[test]
fn new_mutation_after_undo_clears_redo() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    add_shape(&mut ctx, "b", 50.0, 50.0);

    Command::Undo.execute(&mut ctx).unwrap();
    assert!(ctx.history.can_redo());

    add_shape(&mut ctx, "c", 90.0, 90.0);
    assert!(!ctx.history.can_redo());

    let before = fingerprint(&ctx);
    Command::Redo.execute(&mut ctx).unwrap();
    assert_eq!(fingerprint(&ctx), before, "redo after a mutation is a no-op");
}

#[test]
fn undo_on_fresh_history_is_a_noop() {
    let mut ctx = new_editor();
    let undone = ctx.history.undo(&mut ctx.scene).unwrap();
    assert!(!undone);
    assert!(ctx.scene.is_empty());
}

#[test]
fn redo_with_empty_stack_is_a_noop() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    let before = fingerprint(&ctx);
    let redone = ctx.history.redo(&mut ctx.scene).unwrap();
    assert!(!redone);
    assert_eq!(fingerprint(&ctx), before);
}

#[test]
fn replay_preserves_stacking_order() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "bottom", 0.0, 0.0);
    add_shape(&mut ctx, "middle", 1.0, 1.0);
    add_shape(&mut ctx, "top", 2.0, 2.0);

    Command::Undo.execute(&mut ctx).unwrap();
    Command::Redo.execute(&mut ctx).unwrap();

    let names: Vec<&str> = ctx
        .scene
        .entities()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, ["bottom", "middle", "top"]);
}

#[test]
fn snapshots_are_immune_to_later_mutation() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    let id = ctx.scene.entities()[0].id();

    // Mutate the live entity without recording anything.
    ctx.scene.find_mut(id).unwrap().position = pos2(999.0, 999.0);

    Command::Undo.execute(&mut ctx).unwrap();
    Command::Redo.execute(&mut ctx).unwrap();

    let restored = ctx.scene.find(id).expect("entity restored by redo");
    assert_eq!(restored.position, pos2(10.0, 10.0));
}

#[test]
fn replay_keeps_group_nesting() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    add_shape(&mut ctx, "b", 50.0, 50.0);
    Command::SelectAll.execute(&mut ctx).unwrap();
    Command::GroupSelection.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.len(), 1);

    Command::Undo.execute(&mut ctx).unwrap();
    Command::Redo.execute(&mut ctx).unwrap();

    assert_eq!(ctx.scene.len(), 1);
    let group = &ctx.scene.entities()[0];
    assert!(group.is_group());
    assert_eq!(group.children().unwrap().len(), 2);
}

#[test]
fn failed_snapshot_leaves_existing_history_valid() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    let depth_before = ctx.history.depth();

    // A tower of groups past the nesting limit cannot be cloned.
    let mut tower = Entity::new_shape(
        "leaf",
        ShapePayload {
            width: 4.0,
            height: 4.0,
            fill: Color32::WHITE,
            stroke: Color32::BLACK,
            stroke_width: 1.0,
            dashed: false,
        },
        pos2(0.0, 0.0),
    );
    for _ in 0..40 {
        tower = Entity::new_group("g", vec![tower], pos2(0.0, 0.0));
    }
    ctx.scene.insert_top(tower);

    assert!(ctx.history.record_state(&ctx.scene).is_err());
    assert_eq!(ctx.history.depth(), depth_before);
    assert!(ctx.history.can_undo());

    // The surviving stack still replays cleanly.
    ctx.scene.take_events();
    assert!(ctx.history.undo(&mut ctx.scene).unwrap());
    assert!(ctx.scene.is_empty());
}

#[test]
fn visibility_toggle_does_not_enter_history() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    let id = ctx.scene.entities()[0].id();
    let depth = ctx.history.depth();

    Command::ToggleVisibility { id }.execute(&mut ctx).unwrap();
    assert_eq!(ctx.history.depth(), depth);
    assert!(!ctx.scene.find(id).unwrap().visible);
}

#[test]
fn paste_offsets_accumulate_and_are_undoable() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    Command::Copy.execute(&mut ctx).unwrap();
    Command::Paste.execute(&mut ctx).unwrap();
    Command::Paste.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.len(), 3);
    assert_eq!(ctx.scene.entities()[1].position, pos2(20.0, 20.0));
    assert_eq!(ctx.scene.entities()[2].position, pos2(30.0, 30.0));

    Command::Undo.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.len(), 2);
}

#[test]
fn move_records_one_snapshot_when_notified() {
    let mut ctx = new_editor();
    add_shape(&mut ctx, "a", 10.0, 10.0);
    let id = ctx.scene.entities()[0].id();
    let depth = ctx.history.depth();

    // A drag mutates silently, then announces once on release.
    {
        let entity = ctx.scene.find_mut(id).unwrap();
        entity.position += vec2(5.0, 5.0);
        entity.position += vec2(5.0, 5.0);
    }
    ctx.scene.notify_modified(id);
    ctx.pump_history();

    assert_eq!(ctx.history.depth(), depth + 1);
    Command::Undo.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.find(id).unwrap().position, pos2(10.0, 10.0));
}
