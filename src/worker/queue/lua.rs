//! Lua scripts for the KillmailQueue redis implementation

// Lua script to add killmail references to the sorted set without touching existing entries
// The member is the JSON encoded reference, so a reference already waiting keeps its score
//
// KEYS[1]: sorted set key (queue name)
// ARGV: alternating score and member pairs
//
// Returns: number of references added
pub static PUSH_SCRIPT: &str = r#"
local queue_key = KEYS[1]
if #ARGV == 0 then
    return 0
end

return redis.call('ZADD', queue_key, 'NX', unpack(ARGV))
"#;

// Lua script to remove and return the highest scored references
//
// KEYS[1]: sorted set key (queue name)
// ARGV[1]: maximum number of references to pop
//
// Returns: list of members, highest score first
pub static POP_SCRIPT: &str = r#"
local queue_key = KEYS[1]
local count = tonumber(ARGV[1])

local popped = redis.call('ZPOPMAX', queue_key, count)
local members = {}
for i = 1, #popped, 2 do
    members[#members + 1] = popped[i]
end

return members
"#;

// Lua script to return a failed reference to the queue or dead-letter it once it has failed
// too often
//
// KEYS[1]: sorted set key (queue name)
// KEYS[2]: hash of failed attempts per member
// KEYS[3]: dead-letter sorted set
// ARGV[1]: member
// ARGV[2]: max attempts
// ARGV[3]: score to requeue with
// ARGV[4]: dead-letter score (unix timestamp)
//
// Returns:
//   number of failed attempts so far if the reference was requeued
//   -1 if the reference was moved to the dead-letter set
pub static REQUEUE_SCRIPT: &str = r#"
local queue_key = KEYS[1]
local attempts_key = KEYS[2]
local dead_key = KEYS[3]
local member = ARGV[1]
local max_attempts = tonumber(ARGV[2])

local attempts = redis.call('HINCRBY', attempts_key, member, 1)
if attempts >= max_attempts then
    redis.call('HDEL', attempts_key, member)
    redis.call('ZADD', dead_key, tonumber(ARGV[4]), member)
    return -1
end

redis.call('ZADD', queue_key, tonumber(ARGV[3]), member)
return attempts
"#;

// Lua script to park a reference ESI rejected as unprocessable
//
// KEYS[1]: invalid set
// KEYS[2]: hash of failed attempts per member
// ARGV[1]: member
//
// Returns:
//   1 if the member was added
//   0 if it was already marked invalid
pub static INVALID_SCRIPT: &str = r#"
redis.call('HDEL', KEYS[2], ARGV[1])
return redis.call('SADD', KEYS[1], ARGV[1])
"#;
