pub mod collaborators;
pub mod compression;
pub mod core;
pub mod index;
pub mod queue;
pub mod query;
pub mod scoring;
pub mod storage;

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                              FINSEARCH-CORE STRUCT ARCHITECTURE                              │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────── C1: SPILL QUEUE (queue::) ─────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                          struct SpillQueue<T>                                        │    │
│  │  inner: Mutex<Inner>              // primary, overflow_buffer, durable store         │    │
│  │  memory_cap: usize                // M                                               │    │
│  │  put(item) / get() / peek() / size() / memory_size() / clear()                       │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────────────────┐        ┌──────────────────────────────────────────┐      │
│  │ struct SpillStore            │        │ Inner                                    │      │
│  │ • path: PathBuf              │        │ • primary: VecDeque<Vec<u8>>             │      │
│  │ • file: File                 │        │ • overflow_buffer: VecDeque<Vec<u8>>     │      │
│  │ • count: u64                 │        │ • store: SpillStore                      │      │
│  │ push_batch / pop_front_batch │        └──────────────────────────────────────────┘      │
│  │ truncated at open()          │                                                            │
│  └──────────────────────────────┘                                                            │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────── C2: SHARDED INDEX BUILDER (index::) ─────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                          struct Builder<'a>                                          │    │
│  │  storage: StorageLayout                                                             │    │
│  │  config: Config                                                                      │    │
│  │  tokenizer: Box<dyn Tokenizer>                                                       │    │
│  │  doc_store: &'a dyn DocumentStore                                                    │    │
│  │  build() -> Result<ShardSet>      // pass 1 (lengths) -> pass 2 (postings) -> finalize│    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌───────────────────────────────┐     │
│  │ struct ShardSet       │  │ struct Shard          │  │ struct Posting                │     │
│  │ • shards: Vec<Shard>  │  │ • shard_id: u16       │  │ • doc_id: DocId                │     │
│  │ • stats: IndexStats   │  │ • inner: Mutex<..>    │  │ • tf: u32                      │     │
│  │ get_postings(term)    │  │   (state, buffer,     │  │ • positions: Vec<u32>          │     │
│  └──────────────────────┘  │    meta, disk_cache)  │  │ • doc_length: u32              │     │
│                             │ add_posting / flush /  │  └───────────────────────────────┘     │
│                             │ finalize / get_postings│                                        │
│                             └──────────────────────┘                                          │
│                                                                                              │
│  shard_id(term, N) = MD5(term) mod N  (index::hash)                                         │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────── C3: BM25 QUERY EVALUATOR (query::, scoring::) ─────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                        struct QueryEvaluator<'a>                                     │    │
│  │  shard_set: &'a ShardSet                                                             │    │
│  │  tokenizer: &'a dyn Tokenizer                                                        │    │
│  │  doc_store: &'a dyn DocumentStore                                                    │    │
│  │  scorer: BM25Scorer                                                                  │    │
│  │  search(query, k) -> Vec<QueryResult>            // conjunctive                      │    │
│  │  search_disjunctive(query, k) -> Vec<QueryResult> // union fallback                  │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌───────────────────────────────┐     │
│  │ struct BM25Scorer     │  │ struct TopKCollector  │  │ struct QueryResult             │     │
│  │ • k1: f64             │  │ • heap: BinaryHeap    │  │ • doc_id, score                │     │
│  │ • b: f64              │  │   <ScoredDoc>         │  │ • title, url, summary          │     │
│  │ idf() / score()       │  │ • k: usize            │  └───────────────────────────────┘     │
│  └──────────────────────┘  └──────────────────────┘                                          │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────── COLLABORATORS (collaborators::) ──────────────────────────┐
│  trait DocumentStore   -> SegmentedDocumentStore (append-only, length-prefixed, crc32'd)     │
│  trait Tokenizer       -> StandardTokenizer (unicode words, lowercase, stopwords, length)     │
└────────────────────────────────────────────────────────────────────────────────────────────┘

Relationships: the crawler feeds a SpillQueue (C1) whose drained items become documents in a
DocumentStore; Builder (C2) reads that store in two passes and produces a ShardSet; a
QueryEvaluator (C3) borrows a ShardSet, a Tokenizer, and a DocumentStore to answer queries.
Nothing here is a live, mutable index — the build is a batch step between crawling and querying.
*/
