use eframe_studio::command::{Command, CommandContext};
use eframe_studio::scene::{EntityKind, ShapePayload};
use egui::{Color32, pos2};

fn new_editor() -> CommandContext {
    CommandContext::new().expect("fresh editor")
}

fn add_square(ctx: &mut CommandContext, name: &str, center: egui::Pos2) -> usize {
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
        position: center,
    }
    .execute(ctx)
    .expect("add shape");
    ctx.scene
        .entities()
        .last()
        .map(|e| e.id())
        .expect("inserted")
}

#[test]
fn group_collects_selection_and_preserves_world_bounds() {
    let mut ctx = new_editor();
    let a = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    let b = add_square(&mut ctx, "b", pos2(110.0, 10.0));
    ctx.scene.select_many(vec![a, b]);

    Command::GroupSelection.execute(&mut ctx).unwrap();

    assert_eq!(ctx.scene.len(), 1);
    let group = &ctx.scene.entities()[0];
    assert!(group.is_group());
    assert_eq!(group.children().unwrap().len(), 2);
    assert!(ctx.scene.is_selected(group.id()));

    let bounds = ctx.scene.bounding_rect(group.id()).unwrap();
    assert_eq!(
        bounds,
        egui::Rect::from_min_max(pos2(0.0, 0.0), pos2(120.0, 20.0))
    );
}

#[test]
fn ungroup_restores_children_to_the_top_level() {
    let mut ctx = new_editor();
    let a = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    let b = add_square(&mut ctx, "b", pos2(110.0, 10.0));
    ctx.scene.select_many(vec![a, b]);
    Command::GroupSelection.execute(&mut ctx).unwrap();
    Command::UngroupSelection.execute(&mut ctx).unwrap();

    assert_eq!(ctx.scene.len(), 2);
    let positions: Vec<_> = ctx.scene.entities().iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![pos2(10.0, 10.0), pos2(110.0, 10.0)]);
    // Both children come back selected.
    assert_eq!(ctx.scene.selected_ids().len(), 2);
}

#[test]
fn grouping_a_single_entity_is_a_noop() {
    let mut ctx = new_editor();
    let a = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    ctx.scene.select_many(vec![a]);
    Command::GroupSelection.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.len(), 1);
    assert_eq!(ctx.scene.entities()[0].kind(), EntityKind::Shape);
}

#[test]
fn deleting_the_last_group_member_removes_the_group() {
    let mut ctx = new_editor();
    let a = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    let b = add_square(&mut ctx, "b", pos2(110.0, 10.0));
    ctx.scene.select_many(vec![a, b]);
    Command::GroupSelection.execute(&mut ctx).unwrap();

    // Delete the children one at a time, through the group.
    ctx.scene.select_only(a);
    Command::DeleteSelection.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.len(), 1, "group survives with one child left");

    ctx.scene.select_only(b);
    Command::DeleteSelection.execute(&mut ctx).unwrap();
    assert!(ctx.scene.is_empty(), "empty group is removed with its child");
}

#[test]
fn clipboards_do_not_leak_between_editors() {
    let mut first = new_editor();
    let mut second = new_editor();

    let id = add_square(&mut first, "a", pos2(10.0, 10.0));
    first.scene.select_only(id);
    Command::Copy.execute(&mut first).unwrap();
    Command::Paste.execute(&mut second).unwrap();

    assert!(second.scene.is_empty());
    assert!(second.clipboard.is_empty());
    assert!(!first.clipboard.is_empty());
}

#[test]
fn paste_creates_fresh_ids() {
    let mut ctx = new_editor();
    let id = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    ctx.scene.select_only(id);
    Command::Copy.execute(&mut ctx).unwrap();
    Command::Paste.execute(&mut ctx).unwrap();

    assert_eq!(ctx.scene.len(), 2);
    let pasted = ctx.scene.entities()[1].id();
    assert_ne!(pasted, id);
    // The pasted entity becomes the selection.
    assert!(ctx.scene.is_selected(pasted));
    assert!(!ctx.scene.is_selected(id));
}

#[test]
fn select_all_selects_every_top_level_entity() {
    let mut ctx = new_editor();
    add_square(&mut ctx, "a", pos2(10.0, 10.0));
    add_square(&mut ctx, "b", pos2(50.0, 10.0));
    add_square(&mut ctx, "c", pos2(90.0, 10.0));

    Command::SelectAll.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.selected_ids().len(), 3);
}

#[test]
fn locking_an_entity_clears_its_selection() {
    let mut ctx = new_editor();
    let id = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    assert!(ctx.scene.is_selected(id));

    Command::ToggleLock { id }.execute(&mut ctx).unwrap();
    assert!(ctx.scene.find(id).unwrap().locked);
    assert!(ctx.scene.selected_ids().is_empty());

    Command::ToggleLock { id }.execute(&mut ctx).unwrap();
    assert!(!ctx.scene.find(id).unwrap().locked);
}

#[test]
fn visibility_toggle_cascades_into_groups() {
    let mut ctx = new_editor();
    let a = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    let b = add_square(&mut ctx, "b", pos2(110.0, 10.0));
    ctx.scene.select_many(vec![a, b]);
    Command::GroupSelection.execute(&mut ctx).unwrap();
    let group_id = ctx.scene.entities()[0].id();

    Command::ToggleVisibility { id: group_id }
        .execute(&mut ctx)
        .unwrap();
    let group = ctx.scene.find(group_id).unwrap();
    assert!(!group.visible);
    assert!(group.children().unwrap().iter().all(|c| !c.visible));
}

#[test]
fn restack_moves_entities_within_bounds() {
    let mut ctx = new_editor();
    let a = add_square(&mut ctx, "a", pos2(10.0, 10.0));
    let _b = add_square(&mut ctx, "b", pos2(50.0, 10.0));

    Command::Restack { id: a, delta: 1 }.execute(&mut ctx).unwrap();
    let names: Vec<&str> = ctx
        .scene
        .entities()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, ["b", "a"]);

    // Already on top: pushing further is a no-op.
    Command::Restack { id: a, delta: 1 }.execute(&mut ctx).unwrap();
    let names: Vec<&str> = ctx
        .scene
        .entities()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, ["b", "a"]);
}

#[test]
fn rename_is_recorded_in_history() {
    let mut ctx = new_editor();
    let id = add_square(&mut ctx, "a", pos2(10.0, 10.0));

    Command::RenameEntity {
        id,
        name: "renamed".into(),
    }
    .execute(&mut ctx)
    .unwrap();
    assert_eq!(ctx.scene.find(id).unwrap().name, "renamed");

    Command::Undo.execute(&mut ctx).unwrap();
    assert_eq!(ctx.scene.find(id).unwrap().name, "a");
}
