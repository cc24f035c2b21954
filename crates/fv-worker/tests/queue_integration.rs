//! Redis/Queue integration tests.

/// Test Redis connection and basic operations.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_connection() {
    dotenvy::dotenv().ok();

    let queue = fv_queue::JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    // Test queue length (should not error)
    let len = queue.len().await.expect("Failed to get queue length");
    println!("Queue length: {}", len);
}

/// Test job enqueue and dequeue cycle.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_job_enqueue_dequeue() {
    use fv_models::ImageId;
    use fv_queue::ProcessImageJob;

    dotenvy::dotenv().ok();

    let queue = fv_queue::JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    // Create a test job
    let job = ProcessImageJob::new(
        "test_user",
        "test-identity",
        ImageId::new(),
        "uploads/test_user/photo.jpg",
        "test-group",
        1_700_000_000_000,
    );
    let job_id = job.job_id.clone();

    // Enqueue
    let message_id = queue.enqueue_process(job).await.expect("Failed to enqueue");
    println!("Enqueued job {} with message ID {}", job_id, message_id);

    // Consume
    let consumer_name = "test-consumer";
    let jobs = queue
        .consume(consumer_name, 1000, 1)
        .await
        .expect("Failed to consume");

    assert_eq!(jobs.len(), 1);
    let (msg_id, consumed_job) = &jobs[0];
    assert_eq!(consumed_job.job_id(), &job_id);

    // Acknowledge
    queue.ack(msg_id).await.expect("Failed to ack");
    println!("Job {} acknowledged", job_id);
}

/// Test duplicate submissions are dropped by the dedup key.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_enqueue_deduplication() {
    use fv_queue::MergePeopleJob;

    dotenvy::dotenv().ok();

    let queue = fv_queue::JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let ids = vec!["person-a".to_string(), "person-b".to_string()];
    let first = MergePeopleJob::new("test-group-dedup", ids.clone());
    let second = MergePeopleJob::new("test-group-dedup", ids);

    queue.enqueue_merge(first).await.expect("Failed to enqueue");

    // Same idempotency key: the second submit is rejected
    let duplicate = queue.enqueue_merge(second).await;
    assert!(duplicate.is_err());
}
