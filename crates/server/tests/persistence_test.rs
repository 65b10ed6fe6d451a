//! Persistence gateway behavior against an in-memory database.

mod common;

use server::db::games;

#[tokio::test]
async fn created_games_start_open() {
    let pool = common::memory_pool().await;
    let id = games::create_game(&pool, 1500, 0.5).await.unwrap();

    let game = games::get_game(&pool, id).await.unwrap().unwrap();
    assert!(game["end_time"].is_null());
    assert!(game["result"].is_null());
    assert!(game["start_time"].is_string());
    assert_eq!(game["engine_elo"].as_i64(), Some(1500));
    assert_eq!(game["engine_time_limit"].as_f64(), Some(0.5));
    assert_eq!(game["white_player"].as_str(), Some("Human"));
    assert_eq!(game["black_player"].as_str(), Some("Stockfish"));
}

#[tokio::test]
async fn missing_game_reads_as_none() {
    let pool = common::memory_pool().await;
    assert!(games::get_game(&pool, 12345).await.unwrap().is_none());
    assert!(games::get_game_moves(&pool, 12345).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_lists_only_finished_games_newest_first() {
    let pool = common::memory_pool().await;

    let open = games::create_game(&pool, 1320, 0.1).await.unwrap();
    let mut finished = Vec::new();
    for _ in 0..3 {
        let id = games::create_game(&pool, 1320, 0.1).await.unwrap();
        games::finalize_game(&pool, id, "1-0", "Checkmate", "[pgn]", 10, None)
            .await
            .unwrap();
        finished.push(id);
    }

    assert_eq!(games::count_finished_games(&pool).await.unwrap(), 3);

    let page = games::list_finished_games(&pool, 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    // Same start_time second for all rows here, so id decides the order
    assert_eq!(page[0]["id"].as_i64(), Some(finished[2]));
    assert!(page.iter().all(|g| g["id"].as_i64() != Some(open)));

    let rest = games::list_finished_games(&pool, 2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0]["id"].as_i64(), Some(finished[0]));
}

#[tokio::test]
async fn finalize_writes_once() {
    let pool = common::memory_pool().await;
    let id = games::create_game(&pool, 1320, 0.1).await.unwrap();

    let first = games::finalize_game(&pool, id, "0-1", "Checkmate", "[pgn]", 4, Some("King's Pawn Opening"))
        .await
        .unwrap();
    assert!(first);

    let second = games::finalize_game(&pool, id, "1-0", "Stalemate", "[other]", 9, None)
        .await
        .unwrap();
    assert!(!second);

    let game = games::get_game(&pool, id).await.unwrap().unwrap();
    assert_eq!(game["result"].as_str(), Some("0-1"));
    assert_eq!(game["termination"].as_str(), Some("Checkmate"));
    assert_eq!(game["opening_name"].as_str(), Some("King's Pawn Opening"));
    assert_eq!(game["total_moves"].as_i64(), Some(4));
}

#[tokio::test]
async fn move_rows_keep_insertion_order() {
    let pool = common::memory_pool().await;
    let id = games::create_game(&pool, 1320, 0.1).await.unwrap();

    games::insert_move(&pool, id, 1, "e4", "fen-a", Some(0.3), Some("e7e5"))
        .await
        .unwrap();
    games::insert_move(&pool, id, 1, "e5", "fen-b", None, None)
        .await
        .unwrap();
    games::insert_move(&pool, id, 2, "Nf3", "fen-c", Some(-0.1), None)
        .await
        .unwrap();

    let rows = games::get_game_moves(&pool, id).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["move_notation"].as_str(), Some("e4"));
    assert_eq!(rows[0]["evaluation"].as_f64(), Some(0.3));
    assert_eq!(rows[0]["best_move"].as_str(), Some("e7e5"));
    assert_eq!(rows[1]["move_notation"].as_str(), Some("e5"));
    assert!(rows[1]["evaluation"].is_null());
    assert_eq!(rows[2]["move_notation"].as_str(), Some("Nf3"));
}

#[tokio::test]
async fn database_ping() {
    let pool = common::memory_pool().await;
    assert!(games::ping(&pool).await);
}
